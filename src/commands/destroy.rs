//! `destroy`.

use anyhow::Result;
use reconcile::{CompareOptions, ExecuteOptions, Execution};

use super::{TerminalConfirm, compare_project, finish};
use crate::Context;
use crate::cli::DestroyArgs;
use crate::display;
use crate::progress::SpinnerProgress;
use crate::ui;

fn options(args: &DestroyArgs) -> ExecuteOptions {
    ExecuteOptions {
        dry_run: args.dry_run,
        assume_yes: args.non_interactive,
        abort_on_first_error: args.fail_fast,
    }
}

pub fn run(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let changes = compare_project(ctx, &gateway, &CompareOptions::default())?;
    display::print_destroy_preview(&changes);

    println!();
    let mut progress = SpinnerProgress::new(ctx.quiet);
    let execution = reconcile::destroy(
        &changes,
        &gateway,
        &options(args),
        &mut progress,
        &mut TerminalConfirm,
    )?;
    drop(progress);

    match execution {
        Execution::DryRun => ui::info("Dry run complete! No resources were destroyed."),
        Execution::NothingToDo => ui::success("No resources to destroy"),
        Execution::Declined => ui::warn("Destroy cancelled"),
        Execution::Completed(report) => return finish(report, true),
    }
    Ok(())
}
