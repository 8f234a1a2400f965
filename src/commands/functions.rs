//! `functions list | delete | replay-blocks`.

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use reconcile::Gateway;
use reconcile::gateway::{function_dictionary, webhook_dictionary};
use std::collections::HashMap;

use crate::Context;
use crate::cli::{FunctionsCommand, ReplayArgs};
use crate::display::Table;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, cmd: FunctionsCommand) -> Result<()> {
    let gateway = ctx.gateway()?;
    match cmd {
        FunctionsCommand::List => list(ctx, &gateway),
        FunctionsCommand::Delete { name } => {
            let id = delete(&gateway, &name)?;
            ui::success(&format!("Deleted function {name} ({id})"));
            Ok(())
        }
        FunctionsCommand::ReplayBlocks(args) => replay(ctx, &gateway, &args),
    }
}

/// Rows of the `functions list` table.
fn list_table(gateway: &dyn Gateway, with_description: bool) -> Result<Table> {
    let functions = function_dictionary(gateway).context("Could not list functions")?;
    let webhook_names: HashMap<String, String> = webhook_dictionary(gateway)
        .context("Could not list webhooks")?
        .into_values()
        .map(|w| (w.webhook_id, w.webhook_name))
        .collect();

    let mut headers = vec!["function_name", "function_id", "chain_id", "webhook", "enabled"];
    if with_description {
        headers.push("description");
    }
    let mut table = Table::new(&headers);
    for function in functions.into_values() {
        let webhook = webhook_names
            .get(&function.webhook_id)
            .cloned()
            .unwrap_or(function.webhook_id);
        let mut row = vec![
            function.function_name,
            function.function_id,
            function.chain_id,
            webhook,
            function.is_enabled.to_string(),
        ];
        if with_description {
            row.push(function.description.unwrap_or_default());
        }
        table.row(row);
    }
    Ok(table)
}

fn list(ctx: &Context, gateway: &dyn Gateway) -> Result<()> {
    let pb = progress::spinner("Fetching functions...");
    let table = list_table(gateway, ctx.verbose > 0);
    progress::finish_clear(&pb);
    ui::header("Functions");
    table?.print();
    Ok(())
}

/// Delete a function by name, returning its id.
fn delete(gateway: &dyn Gateway, name: &str) -> Result<String> {
    let functions = function_dictionary(gateway).context("Could not list functions")?;
    let Some(function) = functions.get(name) else {
        bail!("Function {name} not found");
    };
    let id = function.function_id.clone();
    gateway
        .delete_function(&id)
        .with_context(|| format!("Error occurred while deleting function {name} ({id})"))?;
    Ok(id)
}

fn replay(ctx: &Context, gateway: &dyn Gateway, args: &ReplayArgs) -> Result<()> {
    let raw = reconcile::load_raw(&ctx.project)
        .with_context(|| format!("Could not load project {}", ctx.project.display()))?;
    let declared: Vec<String> = raw.functions.into_keys().collect();
    let deployed = function_dictionary(gateway).context("Could not list functions")?;

    let plan = reconcile::plan_replay(&declared, &args.functions, &deployed, &args.start, &args.end)?;
    for name in &plan.not_deployed {
        ui::warn(&format!("Function {name} not deployed, skipping..."));
    }
    if plan.requests.is_empty() {
        ui::info("No deployed functions to replay");
        return Ok(());
    }

    let pb = progress::spinner("Replaying blocks...");
    let result = reconcile::replay::replay(gateway, &plan);
    progress::finish_clear(&pb);
    result?;

    for request in &plan.requests {
        ui::success(&format!(
            "Replaying blocks {}..{} on {} ({})",
            request.start_block_number,
            request.end_block_number,
            request.chain_id.bold(),
            ui::count(request.functions.len(), "function", "functions")
        ));
    }
    Ok(())
}
