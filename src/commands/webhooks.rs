//! `webhooks list | delete`.

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::Gateway;
use reconcile::gateway::{function_dictionary, webhook_dictionary};

use crate::Context;
use crate::cli::WebhooksCommand;
use crate::display::Table;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, cmd: WebhooksCommand) -> Result<()> {
    let gateway = ctx.gateway()?;
    match cmd {
        WebhooksCommand::List => {
            let pb = progress::spinner("Fetching webhooks...");
            let table = list_table(&gateway);
            progress::finish_clear(&pb);
            ui::header("Webhooks");
            table?.print();
            Ok(())
        }
        WebhooksCommand::Delete { name } => {
            let id = delete(&gateway, &name)?;
            ui::success(&format!("Deleted webhook {name} ({id})"));
            Ok(())
        }
    }
}

fn list_table(gateway: &dyn Gateway) -> Result<Table> {
    let webhooks = webhook_dictionary(gateway).context("Could not list webhooks")?;
    let mut table = Table::new(&["webhook_name", "webhook_id", "url"]);
    for webhook in webhooks.into_values() {
        table.row(vec![webhook.webhook_name, webhook.webhook_id, webhook.url]);
    }
    Ok(table)
}

/// Delete a webhook by name, returning its id.
///
/// Refuses while a deployed function still delivers to it.
fn delete(gateway: &dyn Gateway, name: &str) -> Result<String> {
    let webhooks = webhook_dictionary(gateway).context("Could not list webhooks")?;
    let Some(webhook) = webhooks.get(name) else {
        bail!("Webhook {name} not found");
    };
    let id = webhook.webhook_id.clone();

    let users: Vec<String> = function_dictionary(gateway)
        .context("Could not list functions")?
        .into_values()
        .filter(|f| f.webhook_id == id)
        .map(|f| f.function_name)
        .collect();
    if !users.is_empty() {
        bail!("Webhook {name} is still used by {}", users.join(", "));
    }

    gateway
        .delete_webhook(&id)
        .with_context(|| format!("Error occurred while deleting webhook {name} ({id})"))?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::gateway::Call;
    use reconcile::{MockGateway, RemoteFunction, RemoteWebhook};

    fn webhook(id: &str, name: &str) -> RemoteWebhook {
        RemoteWebhook {
            webhook_id: id.to_string(),
            webhook_name: name.to_string(),
            url: format!("https://{name}"),
            secret: None,
        }
    }

    #[test]
    fn test_list_table() {
        let mock = MockGateway::new();
        mock.add_webhook(webhook("w-2", "b"));
        mock.add_webhook(webhook("w-1", "a"));
        let lines = list_table(&mock).unwrap().render();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("https://a"));
    }

    #[test]
    fn test_delete_refuses_used_webhook() {
        let mock = MockGateway::new();
        mock.add_webhook(webhook("w-1", "a"));
        mock.add_webhook(webhook("w-2", "b"));
        mock.add_function(
            RemoteFunction {
                function_id: "f-1".to_string(),
                function_name: "f".to_string(),
                chain_id: "CHAIN_ETH_MAINNET".to_string(),
                triggers: vec![],
                webhook_id: "w-1".to_string(),
                is_enabled: true,
                should_send_std_streams: None,
                description: None,
            },
            "",
        );

        let err = delete(&mock, "a").unwrap_err();
        assert_eq!(err.to_string(), "Webhook a is still used by f");
        assert_eq!(delete(&mock, "b").unwrap(), "w-2");
        assert_eq!(mock.mutations(), vec![Call::DeleteWebhook("w-2".to_string())]);
        assert!(delete(&mock, "missing").is_err());
    }
}
