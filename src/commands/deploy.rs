//! `preview` and `deploy`.

use anyhow::Result;
use reconcile::{CompareOptions, ExecuteOptions, Execution};

use super::{TerminalConfirm, compare_project, finish};
use crate::Context;
use crate::cli::{DeployArgs, PreviewArgs};
use crate::display;
use crate::progress::SpinnerProgress;
use crate::ui;

fn options(args: &DeployArgs) -> ExecuteOptions {
    ExecuteOptions {
        dry_run: args.dry_run,
        assume_yes: args.non_interactive,
        abort_on_first_error: !args.keep_going,
    }
}

pub fn preview(ctx: &Context, args: &PreviewArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let compare = CompareOptions {
        warn_on_forbidden_subgraphs: args.warn_on_forbidden_subgraphs,
    };
    let changes = compare_project(ctx, &gateway, &compare)?;
    display::print_deploy_preview(&changes);
    Ok(())
}

pub fn run(ctx: &Context, args: &DeployArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let compare = CompareOptions {
        warn_on_forbidden_subgraphs: true,
    };
    let changes = compare_project(ctx, &gateway, &compare)?;
    display::print_deploy_preview(&changes);

    println!();
    let mut progress = SpinnerProgress::new(ctx.quiet);
    let execution = reconcile::deploy(
        &changes,
        &gateway,
        &options(args),
        &mut progress,
        &mut TerminalConfirm,
    )?;
    drop(progress);

    match execution {
        Execution::DryRun => ui::info("Dry run - no changes made"),
        Execution::NothingToDo => ui::success("No changes to deploy"),
        Execution::Declined => ui::warn("Deployment cancelled"),
        Execution::Completed(report) => return finish(report, false),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_flags() {
        let args = DeployArgs {
            dry_run: false,
            non_interactive: true,
            keep_going: false,
        };
        let opts = options(&args);
        assert!(opts.abort_on_first_error);
        assert!(opts.assume_yes);

        let args = DeployArgs {
            dry_run: true,
            non_interactive: false,
            keep_going: true,
        };
        let opts = options(&args);
        assert!(!opts.abort_on_first_error);
        assert!(opts.dry_run);
    }
}
