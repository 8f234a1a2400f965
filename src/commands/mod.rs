//! Command implementations.

pub mod convert;
pub mod deploy;
pub mod destroy;
pub mod functions;
pub mod subgraphs;
pub mod webhooks;

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{CompareOptions, ConfirmCallback, Gateway, Report, StateComparisonResult};
use std::io;

use crate::Context;
use crate::display;
use crate::progress;
use crate::ui;

/// Confirmation through an interactive terminal prompt.
pub struct TerminalConfirm;

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|dialoguer::Error::IO(e)| e)?;
        Ok(confirmed)
    }
}

/// Load the project and diff it against the remote state.
pub fn compare_project(
    ctx: &Context,
    gateway: &dyn Gateway,
    options: &CompareOptions,
) -> Result<StateComparisonResult> {
    let spec = reconcile::load_project(&ctx.project)
        .with_context(|| format!("Could not load project {}", ctx.project.display()))?;
    log::info!(
        "Loaded {} subgraph(s), {} webhook(s), {} function(s)",
        spec.subgraphs.len(),
        spec.webhooks.len(),
        spec.functions.len()
    );

    let pb = progress::spinner("Comparing state...");
    let result = reconcile::compare(&spec, gateway, options);
    progress::finish_clear(&pb);
    Ok(result?)
}

/// Print a finished run and turn its failures into an error.
pub fn finish(report: Report, destroying: bool) -> Result<()> {
    display::print_report(&report, destroying);
    if let Some(e) = report.error {
        return Err(e.into());
    }
    let failed = report.failed_count();
    if failed > 0 {
        bail!("{} did not complete", ui::count(failed, "resource", "resources"));
    }
    println!();
    if destroying {
        ui::success("Destroy complete!");
    } else {
        ui::success("Deployment complete!");
    }
    Ok(())
}
