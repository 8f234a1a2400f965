//! `subgraphs list | delete`.

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::Gateway;
use reconcile::gateway::subgraph_names;

use crate::Context;
use crate::cli::SubgraphsCommand;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, cmd: SubgraphsCommand) -> Result<()> {
    let gateway = ctx.gateway()?;
    match cmd {
        SubgraphsCommand::List => {
            let pb = progress::spinner("Fetching subgraph schemas...");
            let names = subgraph_names(&gateway, true);
            progress::finish_clear(&pb);
            let names = names.context("Could not list subgraph schemas")?;
            ui::header("Subgraphs");
            if names.is_empty() {
                ui::dim("(none)");
            }
            for name in names {
                println!("  {name}");
            }
            Ok(())
        }
        SubgraphsCommand::Delete { name } => {
            delete(&gateway, &name)?;
            ui::success(&format!("Deleted subgraph schema {name}"));
            Ok(())
        }
    }
}

fn delete(gateway: &dyn Gateway, name: &str) -> Result<()> {
    let names = subgraph_names(gateway, true).context("Could not list subgraph schemas")?;
    if !names.contains(name) {
        bail!("Subgraph schema {name} not found");
    }
    gateway
        .delete_subgraph(name)
        .with_context(|| format!("Error occurred while deleting subgraph schema {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::MockGateway;
    use reconcile::gateway::Call;

    #[test]
    fn test_delete() {
        let mock = MockGateway::new();
        mock.add_subgraph("tokens", "dHlwZSBBIHt9");
        delete(&mock, "tokens").unwrap();
        assert_eq!(mock.mutations(), vec![Call::DeleteSubgraph("tokens".to_string())]);
        assert!(mock.subgraphs().is_empty());

        let err = delete(&mock, "tokens").unwrap_err();
        assert_eq!(err.to_string(), "Subgraph schema tokens not found");
    }

    #[test]
    fn test_delete_without_access() {
        let mock = MockGateway::new();
        mock.forbid_subgraphs();
        assert!(delete(&mock, "tokens").is_err());
        assert!(mock.mutations().is_empty());
    }
}
