//! Deploy and destroy orchestration.
//!
//! Deploy runs subgraphs, then webhooks, then functions: every webhook
//! result is captured before the first function call so that functions can
//! use freshly created webhook ids. Destroy runs functions, then subgraphs,
//! then webhooks, and never deletes a webhook that a surviving function
//! still points at.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::{
    CreateFunction, CreateSubgraph, CreateWebhook, FunctionEntry, ItemResult, Outcome,
    PatchFunction, ResourceKind, ResourceStateChanges, StateComparisonResult, SubgraphEntry,
    WebhookEntry,
};
use std::collections::BTreeMap;

/// Options for deploy and destroy runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Stop after the preview.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
    /// Stop at the first failed create, update or delete call.
    pub abort_on_first_error: bool,
}

impl ExecuteOptions {
    /// Deploy defaults: stop at the first failure.
    pub fn deploy() -> Self {
        Self {
            dry_run: false,
            assume_yes: false,
            abort_on_first_error: true,
        }
    }

    /// Destroy defaults: keep going after failures.
    pub fn destroy() -> Self {
        Self {
            abort_on_first_error: false,
            ..Self::deploy()
        }
    }
}

/// Per-kind results of a run, plus the error that stopped it, if any.
#[derive(Debug, Default)]
pub struct Report {
    pub subgraphs: Vec<ItemResult>,
    pub webhooks: Vec<ItemResult>,
    pub functions: Vec<ItemResult>,
    pub error: Option<Error>,
}

impl Report {
    /// Every item result, in execution order of the kinds.
    pub fn items(&self) -> impl Iterator<Item = &ItemResult> {
        self.subgraphs
            .iter()
            .chain(&self.webhooks)
            .chain(&self.functions)
    }

    pub fn failed_count(&self) -> usize {
        self.items().filter(|r| r.failed()).count()
    }

    /// Whether every attempted call succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_count() == 0
    }
}

/// How a gated run ended.
#[derive(Debug)]
pub enum Execution {
    /// Dry run requested; nothing was called.
    DryRun,
    /// The diff holds nothing to act on.
    NothingToDo,
    /// The user declined the confirmation prompt.
    Declined,
    Completed(Report),
}

const DEPLOY_PROMPT: &str =
    "Please confirm that you have reviewed the changes and want to proceed with the deployment";
const DESTROY_PROMPT: &str =
    "Please confirm that you have reviewed the resources and want to proceed with destroying them";

fn gate<C: ConfirmCallback>(
    has_work: bool,
    opts: &ExecuteOptions,
    confirm: &mut C,
    prompt: &str,
) -> Result<Option<Execution>> {
    if opts.dry_run {
        return Ok(Some(Execution::DryRun));
    }
    if !has_work {
        return Ok(Some(Execution::NothingToDo));
    }
    if !opts.assume_yes && !confirm.confirm(prompt).map_err(|e| Error::io("stdin", e))? {
        return Ok(Some(Execution::Declined));
    }
    Ok(None)
}

/// Confirm and deploy a diff.
pub fn deploy<P, C>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Execution>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    if let Some(stopped) = gate(changes.has_changes_to_deploy(), opts, confirm, DEPLOY_PROMPT)? {
        return Ok(stopped);
    }
    Ok(Execution::Completed(apply_changes(changes, gateway, opts, progress)))
}

/// Confirm and destroy the declared resources of a diff.
pub fn destroy<P, C>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Execution>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    if let Some(stopped) = gate(changes.has_resources_to_destroy(), opts, confirm, DESTROY_PROMPT)? {
        return Ok(stopped);
    }
    Ok(Execution::Completed(destroy_resources(changes, gateway, opts, progress)))
}

// =============================================================================
// Recording
// =============================================================================

fn record<P: ProgressCallback>(results: &mut Vec<ItemResult>, progress: &mut P, result: ItemResult) {
    progress.on_item_complete(&result);
    results.push(result);
}

fn skip_all<'a, T: 'a, P: ProgressCallback>(
    results: &mut Vec<ItemResult>,
    progress: &mut P,
    kind: ResourceKind,
    entries: impl IntoIterator<Item = &'a T>,
    describe: impl Fn(&T) -> (String, Option<String>),
    reason: Option<&str>,
) {
    for entry in entries {
        let (name, id) = describe(entry);
        let outcome = Outcome::Skipped {
            reason: reason.map(String::from),
        };
        record(results, progress, ItemResult::new(kind, name, id, outcome));
    }
}

struct Call<'a> {
    kind: ResourceKind,
    name: &'a str,
    id: Option<String>,
    action: String,
    success: Outcome,
}

/// Record the outcome of a gateway call. A call that returned an id
/// overrides the id already known for the item.
fn settle<P: ProgressCallback>(
    results: &mut Vec<ItemResult>,
    progress: &mut P,
    call: Call<'_>,
    response: Result<Option<String>>,
    abort_on_first_error: bool,
) -> Result<()> {
    match response {
        Ok(new_id) => {
            let id = new_id.or(call.id);
            record(results, progress, ItemResult::new(call.kind, call.name, id, call.success));
            Ok(())
        }
        Err(e) => {
            log::warn!("Failed {}: {}", call.action, e);
            let outcome = Outcome::Failed {
                error: e.to_string(),
            };
            record(results, progress, ItemResult::new(call.kind, call.name, call.id, outcome));
            if abort_on_first_error {
                return Err(Error::mutation(call.action, e));
            }
            Ok(())
        }
    }
}

// =============================================================================
// Deploy
// =============================================================================

/// Create and update resources, without any gating.
pub fn apply_changes<P: ProgressCallback>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Report {
    let mut report = Report::default();
    if let Err(e) = deploy_phases(changes, gateway, opts, progress, &mut report) {
        report.error = Some(e);
    }
    report
}

fn deploy_phases<P: ProgressCallback>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    report: &mut Report,
) -> Result<()> {
    deploy_subgraphs(&changes.subgraphs, gateway, opts, progress, &mut report.subgraphs)?;
    deploy_webhooks(&changes.webhooks, gateway, opts, progress, &mut report.webhooks)?;
    deploy_functions(
        &changes.functions,
        &report.webhooks,
        gateway,
        opts,
        progress,
        &mut report.functions,
    )
}

fn deploy_subgraphs<P: ProgressCallback>(
    changes: &ResourceStateChanges<SubgraphEntry>,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Subgraph;
    progress.on_phase_start(kind, changes.len());

    for entry in &changes.added {
        progress.on_item_start(kind, &entry.schema_name, "create");
        let request = CreateSubgraph {
            name: entry.schema_name.clone(),
            schema: entry.schema.clone().unwrap_or_default(),
        };
        let response = gateway.create_subgraph(&request).map(|()| None);
        let call = Call {
            kind,
            name: &entry.schema_name,
            id: None,
            action: format!("creating subgraph schema {}", entry.schema_name),
            success: Outcome::Deployed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    let describe = |e: &SubgraphEntry| (e.schema_name.clone(), None);
    skip_all(
        results,
        progress,
        kind,
        &changes.changed,
        describe,
        Some("Subgraph schema updates not supported"),
    );
    skip_all(
        results,
        progress,
        kind,
        changes.unchanged.iter().chain(&changes.unreferenced),
        describe,
        None,
    );
    Ok(())
}

fn deploy_webhooks<P: ProgressCallback>(
    changes: &ResourceStateChanges<WebhookEntry>,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Webhook;
    progress.on_phase_start(kind, changes.len());

    for entry in &changes.added {
        progress.on_item_start(kind, &entry.webhook_name, "create");
        let request = CreateWebhook {
            webhook_name: entry.webhook_name.clone(),
            url: entry.url.clone(),
            secret: entry.secret.clone().unwrap_or_default(),
        };
        let response = gateway.create_webhook(&request).map(Some);
        let call = Call {
            kind,
            name: &entry.webhook_name,
            id: None,
            action: format!("creating webhook {}", entry.webhook_name),
            success: Outcome::Deployed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    let describe = |e: &WebhookEntry| (e.webhook_name.clone(), e.webhook_id.clone());
    skip_all(
        results,
        progress,
        kind,
        &changes.changed,
        describe,
        Some("Webhook updates not supported"),
    );
    skip_all(
        results,
        progress,
        kind,
        changes.unchanged.iter().chain(&changes.unreferenced),
        describe,
        None,
    );
    Ok(())
}

/// Id of a webhook that exists after the webhook phase.
fn find_webhook_id<'a>(webhook_results: &'a [ItemResult], name: &str) -> Option<&'a str> {
    webhook_results
        .iter()
        .find(|r| r.name == name && !r.failed())
        .and_then(|r| r.id.as_deref())
}

fn deploy_functions<P: ProgressCallback>(
    changes: &ResourceStateChanges<FunctionEntry>,
    webhook_results: &[ItemResult],
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Function;
    progress.on_phase_start(kind, changes.len());

    for entry in &changes.added {
        let Some(webhook_id) = find_webhook_id(webhook_results, &entry.webhook) else {
            log::info!("Skipping function {}...", entry.function_name);
            let outcome = Outcome::skipped(format!("Webhook {} not found", entry.webhook));
            record(results, progress, ItemResult::new(kind, &entry.function_name, None, outcome));
            continue;
        };

        progress.on_item_start(kind, &entry.function_name, "create");
        let request = CreateFunction {
            function_name: entry.function_name.clone(),
            chain_id: entry.chain_id.clone(),
            triggers: entry.triggers.clone(),
            webhook_id: webhook_id.to_string(),
            function_code: entry.code.clone().unwrap_or_default(),
            should_send_std_streams: entry.should_send_std_streams,
            is_enabled: entry.is_enabled,
            description: entry.description.clone(),
        };
        let response = gateway.create_function(&request).map(Some);
        let call = Call {
            kind,
            name: &entry.function_name,
            id: None,
            action: format!("creating function {}", entry.function_name),
            success: Outcome::Deployed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    for entry in &changes.changed {
        let Some(webhook_id) = find_webhook_id(webhook_results, &entry.webhook) else {
            log::info!("Skipping function {}...", entry.function_name);
            let outcome = Outcome::skipped(format!("Webhook {} not found", entry.webhook));
            let item = ItemResult::new(kind, &entry.function_name, entry.function_id.clone(), outcome);
            record(results, progress, item);
            continue;
        };
        let Some(function_id) = entry.function_id.as_deref() else {
            let outcome = Outcome::skipped("Function id unknown");
            record(results, progress, ItemResult::new(kind, &entry.function_name, None, outcome));
            continue;
        };

        progress.on_item_start(kind, &entry.function_name, "update");
        let request = PatchFunction {
            function_name: entry.function_name.clone(),
            chain_id: entry.chain_id.clone(),
            triggers: entry.triggers.clone(),
            webhook_id: webhook_id.to_string(),
            function_code: entry.code.clone().unwrap_or_default(),
            should_send_std_streams: entry.should_send_std_streams,
            is_enabled: entry.is_enabled,
            description: entry.description.clone(),
        };
        let response = gateway.patch_function(function_id, &request).map(|()| None);
        let call = Call {
            kind,
            name: &entry.function_name,
            id: Some(function_id.to_string()),
            action: format!("updating function {}", entry.function_name),
            success: Outcome::Deployed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    skip_all(
        results,
        progress,
        kind,
        changes.unchanged.iter().chain(&changes.unreferenced),
        |e: &FunctionEntry| (e.function_name.clone(), e.function_id.clone()),
        None,
    );
    Ok(())
}

// =============================================================================
// Destroy
// =============================================================================

const NOT_DECLARED: &str = "Not declared in the project, left in place";

/// Delete every declared resource that exists remotely, without any gating.
pub fn destroy_resources<P: ProgressCallback>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Report {
    let mut report = Report::default();
    if let Err(e) = destroy_phases(changes, gateway, opts, progress, &mut report) {
        report.error = Some(e);
    }
    report
}

fn destroy_phases<P: ProgressCallback>(
    changes: &StateComparisonResult,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    report: &mut Report,
) -> Result<()> {
    destroy_functions(&changes.functions, gateway, opts, progress, &mut report.functions)?;
    destroy_subgraphs(&changes.subgraphs, gateway, opts, progress, &mut report.subgraphs)?;

    let remaining = remaining_references(&changes.functions, &report.functions);
    destroy_webhooks(
        &changes.webhooks,
        &remaining,
        gateway,
        opts,
        progress,
        &mut report.webhooks,
    )
}

fn destroy_functions<P: ProgressCallback>(
    changes: &ResourceStateChanges<FunctionEntry>,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Function;
    let targets = changes.deployed();
    progress.on_phase_start(kind, targets.len());

    for entry in targets {
        let Some(function_id) = entry.function_id.as_deref() else {
            continue;
        };
        progress.on_item_start(kind, &entry.function_name, "delete");
        let response = gateway.delete_function(function_id).map(|()| None);
        let call = Call {
            kind,
            name: &entry.function_name,
            id: Some(function_id.to_string()),
            action: format!("deleting function {}", entry.function_name),
            success: Outcome::Destroyed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    skip_all(
        results,
        progress,
        kind,
        &changes.unreferenced,
        |e: &FunctionEntry| (e.function_name.clone(), e.function_id.clone()),
        Some(NOT_DECLARED),
    );
    Ok(())
}

fn destroy_subgraphs<P: ProgressCallback>(
    changes: &ResourceStateChanges<SubgraphEntry>,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Subgraph;
    let targets = changes.deployed();
    progress.on_phase_start(kind, targets.len());

    for entry in targets {
        progress.on_item_start(kind, &entry.schema_name, "delete");
        let response = gateway.delete_subgraph(&entry.schema_name).map(|()| None);
        let call = Call {
            kind,
            name: &entry.schema_name,
            id: None,
            action: format!("deleting subgraph schema {}", entry.schema_name),
            success: Outcome::Destroyed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    skip_all(
        results,
        progress,
        kind,
        &changes.unreferenced,
        |e: &SubgraphEntry| (e.schema_name.clone(), None),
        Some(NOT_DECLARED),
    );
    Ok(())
}

/// Webhook name to the functions that still reference it after the
/// function phase: undeclared functions and failed deletions.
fn remaining_references(
    functions: &ResourceStateChanges<FunctionEntry>,
    function_results: &[ItemResult],
) -> BTreeMap<String, Vec<String>> {
    let mut remaining: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let survivors = functions.iter().filter(|f| {
        f.function_id.is_some()
            && !function_results
                .iter()
                .any(|r| r.name == f.function_name && r.destroyed())
    });
    for function in survivors {
        remaining
            .entry(function.webhook.clone())
            .or_default()
            .push(function.function_name.clone());
    }
    remaining
}

fn destroy_webhooks<P: ProgressCallback>(
    changes: &ResourceStateChanges<WebhookEntry>,
    remaining: &BTreeMap<String, Vec<String>>,
    gateway: &dyn Gateway,
    opts: &ExecuteOptions,
    progress: &mut P,
    results: &mut Vec<ItemResult>,
) -> Result<()> {
    let kind = ResourceKind::Webhook;
    let targets = changes.deployed();
    progress.on_phase_start(kind, targets.len());

    for entry in targets {
        let Some(webhook_id) = entry.webhook_id.as_deref() else {
            continue;
        };
        if let Some(users) = remaining.get(&entry.webhook_name) {
            let outcome = Outcome::skipped(format!("Still referenced by {}", users.join(", ")));
            let item = ItemResult::new(kind, &entry.webhook_name, Some(webhook_id.to_string()), outcome);
            record(results, progress, item);
            continue;
        }

        progress.on_item_start(kind, &entry.webhook_name, "delete");
        let response = gateway.delete_webhook(webhook_id).map(|()| None);
        let call = Call {
            kind,
            name: &entry.webhook_name,
            id: Some(webhook_id.to_string()),
            action: format!("deleting webhook {}", entry.webhook_name),
            success: Outcome::Destroyed,
        };
        settle(results, progress, call, response, opts.abort_on_first_error)?;
    }

    skip_all(
        results,
        progress,
        kind,
        &changes.unreferenced,
        |e: &WebhookEntry| (e.webhook_name.clone(), e.webhook_id.clone()),
        Some(NOT_DECLARED),
    );
    Ok(())
}
