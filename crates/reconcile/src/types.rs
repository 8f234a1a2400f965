//! Core types: declared spec, remote resources, diff buckets and results.

use crate::trigger::{Trigger, trigger_types};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three kinds of resources managed by a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Subgraph,
    Webhook,
    Function,
}

impl ResourceKind {
    /// Plural label used in headings and error messages.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Subgraph => "subgraphs",
            Self::Webhook => "webhooks",
            Self::Function => "functions",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subgraph => "subgraph",
            Self::Webhook => "webhook",
            Self::Function => "function",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Declared state
// =============================================================================

/// A webhook as declared in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSpec {
    pub url: String,
    pub secret: String,
}

/// A function as declared in YAML, with its code resolved to base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub chain_id: String,
    pub triggers: Vec<Trigger>,
    /// Name of the webhook receiving this function's output.
    pub webhook: String,
    /// Base64 payload: source text or a zipped source directory.
    pub code: String,
    pub is_enabled: Option<bool>,
    pub should_send_std_streams: Option<bool>,
    pub description: Option<String>,
}

/// A subgraph as declared in YAML, with its schema resolved to base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphSpec {
    pub schema: String,
}

/// The merged, resolved contents of every YAML file in a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spec {
    pub webhooks: BTreeMap<String, WebhookSpec>,
    pub functions: BTreeMap<String, FunctionSpec>,
    pub subgraphs: BTreeMap<String, SubgraphSpec>,
}

/// Streams are forwarded unless explicitly disabled.
pub fn should_send_std_streams(value: Option<bool>) -> bool {
    value.unwrap_or(true)
}

// =============================================================================
// Remote state
// =============================================================================

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub page: u32,
    pub pages: u32,
}

/// A webhook as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWebhook {
    pub webhook_id: String,
    pub webhook_name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// A function as returned by the API. The listing never includes code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFunction {
    pub function_id: String,
    pub function_name: String,
    pub chain_id: String,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    pub webhook_id: String,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_send_std_streams: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Diff
// =============================================================================

/// The four buckets every named resource of one kind is partitioned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStateChanges<T> {
    /// Declared but not deployed.
    pub added: Vec<T>,
    /// Declared and deployed, with differences.
    pub changed: Vec<T>,
    /// Declared and deployed, identical.
    pub unchanged: Vec<T>,
    /// Deployed but no longer declared.
    pub unreferenced: Vec<T>,
}

impl<T> Default for ResourceStateChanges<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            changed: Vec::new(),
            unchanged: Vec::new(),
            unreferenced: Vec::new(),
        }
    }
}

impl<T> ResourceStateChanges<T> {
    /// Whether anything would be created or updated.
    pub fn has_pending(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty()
    }

    /// Whether anything declared also exists remotely.
    pub fn has_deployed(&self) -> bool {
        !self.changed.is_empty() || !self.unchanged.is_empty()
    }

    /// Total entries across all buckets.
    pub fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.unchanged.len() + self.unreferenced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every bucket in added, changed, unchanged, unreferenced order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added
            .iter()
            .chain(&self.changed)
            .chain(&self.unchanged)
            .chain(&self.unreferenced)
    }

    /// Entries that exist both in spec and remotely, in name order.
    pub fn deployed(&self) -> Vec<&T>
    where
        T: Named,
    {
        let mut entries: Vec<&T> = self.changed.iter().chain(&self.unchanged).collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }
}

/// Diff entries are identified by their resource name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Why a deployed webhook differs from its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookChange {
    Url { current: String },
    Secret,
}

impl fmt::Display for WebhookChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url { current } => write!(f, "url (currently {current})"),
            Self::Secret => write!(f, "secret"),
        }
    }
}

/// A webhook in one of the diff buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEntry {
    pub webhook_name: String,
    pub url: String,
    pub secret: Option<String>,
    /// Absent for webhooks that have not been created yet.
    pub webhook_id: Option<String>,
    pub changes: Vec<WebhookChange>,
}

impl WebhookEntry {
    pub fn secret_changed(&self) -> bool {
        self.changes.contains(&WebhookChange::Secret)
    }
}

impl Named for WebhookEntry {
    fn name(&self) -> &str {
        &self.webhook_name
    }
}

/// Why a deployed function differs from its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionChange {
    Code,
    Triggers,
    Webhook,
    ShouldSendStdStreams,
    ChainId,
    IsEnabled,
}

impl fmt::Display for FunctionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Code => "code",
            Self::Triggers => "triggers",
            Self::Webhook => "webhook",
            Self::ShouldSendStdStreams => "should_send_std_streams",
            Self::ChainId => "chain_id",
            Self::IsEnabled => "is_enabled",
        };
        write!(f, "{label}")
    }
}

/// A function in one of the diff buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub function_name: String,
    /// Absent for functions that have not been created yet.
    pub function_id: Option<String>,
    pub chain_id: String,
    pub triggers: Vec<Trigger>,
    /// Webhook name, resolved from the id for unreferenced functions.
    pub webhook: String,
    /// Absent when the webhook is itself about to be created.
    pub webhook_id: Option<String>,
    /// Declared code. Absent for unreferenced functions.
    pub code: Option<String>,
    pub is_enabled: Option<bool>,
    pub should_send_std_streams: bool,
    pub description: Option<String>,
    pub changes: Vec<FunctionChange>,
}

impl FunctionEntry {
    /// Comma-joined trigger type tags.
    pub fn trigger_types(&self) -> String {
        trigger_types(&self.triggers)
    }
}

impl Named for FunctionEntry {
    fn name(&self) -> &str {
        &self.function_name
    }
}

/// A subgraph in one of the diff buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphEntry {
    pub schema_name: String,
    /// Declared schema. Absent for unreferenced subgraphs.
    pub schema: Option<String>,
}

impl Named for SubgraphEntry {
    fn name(&self) -> &str {
        &self.schema_name
    }
}

/// The diff of a whole project against remote state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateComparisonResult {
    pub subgraphs: ResourceStateChanges<SubgraphEntry>,
    pub webhooks: ResourceStateChanges<WebhookEntry>,
    pub functions: ResourceStateChanges<FunctionEntry>,
}

impl StateComparisonResult {
    /// Whether a deploy would create or update anything.
    pub fn has_changes_to_deploy(&self) -> bool {
        self.subgraphs.has_pending() || self.webhooks.has_pending() || self.functions.has_pending()
    }

    /// Whether a destroy would delete anything.
    pub fn has_resources_to_destroy(&self) -> bool {
        self.subgraphs.has_deployed() || self.webhooks.has_deployed() || self.functions.has_deployed()
    }

    /// Look up a webhook in any bucket by name.
    pub fn webhook_by_name(&self, name: &str) -> Option<&WebhookEntry> {
        self.webhooks.iter().find(|w| w.webhook_name == name)
    }

    /// Look up a deployed webhook in any bucket by id.
    pub fn webhook_by_id(&self, id: &str) -> Option<&WebhookEntry> {
        self.webhooks
            .iter()
            .find(|w| w.webhook_id.as_deref() == Some(id))
    }
}

// =============================================================================
// Results
// =============================================================================

/// What happened to a single resource during deploy or destroy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed,
    Destroyed,
    Skipped { reason: Option<String> },
    Failed { error: String },
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: Some(reason.into()),
        }
    }
}

/// The per-item line of a deploy or destroy report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub kind: ResourceKind,
    pub name: String,
    pub id: Option<String>,
    pub outcome: Outcome,
}

impl ItemResult {
    pub fn new(kind: ResourceKind, name: impl Into<String>, id: Option<String>, outcome: Outcome) -> Self {
        Self {
            kind,
            name: name.into(),
            id,
            outcome,
        }
    }

    pub fn deployed(&self) -> bool {
        matches!(self.outcome, Outcome::Deployed)
    }

    pub fn destroyed(&self) -> bool {
        matches!(self.outcome, Outcome::Destroyed)
    }

    pub fn skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// Explanation or error text, if any.
    pub fn response(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Skipped { reason } => reason.as_deref(),
            Outcome::Failed { error } => Some(error),
            Outcome::Deployed | Outcome::Destroyed => None,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateWebhook {
    pub webhook_name: String,
    pub url: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateFunction {
    pub function_name: String,
    pub chain_id: String,
    pub triggers: Vec<Trigger>,
    pub webhook_id: String,
    pub function_code: String,
    pub should_send_std_streams: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchFunction {
    pub function_name: String,
    pub chain_id: String,
    pub triggers: Vec<Trigger>,
    pub webhook_id: String,
    pub function_code: String,
    pub should_send_std_streams: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSubgraph {
    pub name: String,
    pub schema: String,
}

/// Re-run functions over a block range on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayBlocks {
    pub chain_id: String,
    pub start_block_number: u64,
    pub end_block_number: u64,
    pub functions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(name: &str, id: Option<&str>) -> WebhookEntry {
        WebhookEntry {
            webhook_name: name.to_string(),
            url: "https://example.com".to_string(),
            secret: None,
            webhook_id: id.map(String::from),
            changes: vec![],
        }
    }

    #[test]
    fn test_resource_state_changes_counts() {
        let mut changes = ResourceStateChanges::default();
        assert!(changes.is_empty());
        assert!(!changes.has_pending());

        changes.unchanged.push(webhook("a", Some("1")));
        assert!(!changes.has_pending());
        assert!(changes.has_deployed());

        changes.added.push(webhook("b", None));
        assert!(changes.has_pending());
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_deployed_sorted_by_name() {
        let mut changes = ResourceStateChanges::default();
        changes.unchanged.push(webhook("b", Some("2")));
        changes.changed.push(webhook("c", Some("3")));
        changes.unchanged.push(webhook("a", Some("1")));
        changes.unreferenced.push(webhook("0", Some("0")));

        let names: Vec<&str> = changes.deployed().iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_webhook_lookup() {
        let mut result = StateComparisonResult::default();
        result.webhooks.added.push(webhook("new", None));
        result.webhooks.unreferenced.push(webhook("old", Some("w-1")));

        assert!(result.webhook_by_name("new").is_some());
        assert_eq!(result.webhook_by_id("w-1").unwrap().webhook_name, "old");
        assert!(result.webhook_by_id("missing").is_none());
    }

    #[test]
    fn test_change_labels() {
        let change = WebhookChange::Url {
            current: "https://old".to_string(),
        };
        assert_eq!(change.to_string(), "url (currently https://old)");
        assert_eq!(FunctionChange::ShouldSendStdStreams.to_string(), "should_send_std_streams");
    }

    #[test]
    fn test_item_result_flat_view() {
        let skipped = ItemResult::new(
            ResourceKind::Function,
            "f",
            None,
            Outcome::skipped("Webhook w not found"),
        );
        assert!(skipped.skipped());
        assert!(!skipped.deployed());
        assert_eq!(skipped.response(), Some("Webhook w not found"));

        let failed = ItemResult::new(
            ResourceKind::Webhook,
            "w",
            None,
            Outcome::Failed {
                error: "500 boom".to_string(),
            },
        );
        assert!(failed.failed());
        assert!(!failed.destroyed());
        assert_eq!(failed.response(), Some("500 boom"));
    }

    #[test]
    fn test_remote_function_defaults() {
        let json = r#"{
            "function_id": "f-1",
            "function_name": "f",
            "chain_id": "CHAIN_ETH_MAINNET",
            "webhook_id": "w-1"
        }"#;
        let function: RemoteFunction = serde_json::from_str(json).unwrap();
        assert!(function.is_enabled);
        assert!(function.triggers.is_empty());
        assert!(function.should_send_std_streams.is_none());
    }

    #[test]
    fn test_should_send_std_streams_default() {
        assert!(should_send_std_streams(None));
        assert!(should_send_std_streams(Some(true)));
        assert!(!should_send_std_streams(Some(false)));
    }
}
