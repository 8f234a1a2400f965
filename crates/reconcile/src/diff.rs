//! State diffing: compare a resolved [`Spec`] with what is deployed.
//!
//! Subgraphs and webhooks are diffed first because functions are matched
//! to webhooks through the computed webhook buckets, which include webhooks
//! that are about to be created.

use crate::code::code_equals;
use crate::error::{Error, Result};
use crate::gateway::{self, Gateway};
use crate::trigger::{self, Trigger, trigger_set_equals};
use crate::types::{
    FunctionChange, FunctionEntry, FunctionSpec, RemoteFunction, ResourceStateChanges, Spec,
    StateComparisonResult, SubgraphEntry, WebhookChange, WebhookEntry, should_send_std_streams,
};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Options for [`compare`].
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Log a warning when the account cannot list subgraphs.
    pub warn_on_forbidden_subgraphs: bool,
}

/// Compute the added/changed/unchanged/unreferenced buckets of every kind.
pub fn compare(
    spec: &Spec,
    gateway: &dyn Gateway,
    options: &CompareOptions,
) -> Result<StateComparisonResult> {
    log::info!("Comparing state...");

    let mut result = StateComparisonResult {
        subgraphs: compare_subgraphs(spec, gateway, options)?,
        webhooks: compare_webhooks(spec, gateway)?,
        ..StateComparisonResult::default()
    };
    result.functions = compare_functions(spec, gateway, &result)?;

    log::info!("{}", DiffSummary::from_result(&result));
    Ok(result)
}

fn compare_subgraphs(
    spec: &Spec,
    gateway: &dyn Gateway,
    options: &CompareOptions,
) -> Result<ResourceStateChanges<SubgraphEntry>> {
    let remote = gateway::subgraph_names(gateway, options.warn_on_forbidden_subgraphs)
        .map_err(|e| Error::fetch("subgraphs", e))?;

    let deployed: Vec<&String> = spec.subgraphs.keys().filter(|n| remote.contains(*n)).collect();
    let schemas: HashMap<&str, String> = deployed
        .par_iter()
        .map(|name| {
            gateway
                .subgraph_schema(name)
                .map(|schema| (name.as_str(), schema))
                .map_err(|e| Error::fetch(format!("subgraph {name}"), e))
        })
        .collect::<Result<_>>()?;

    let mut changes = ResourceStateChanges::default();
    for (name, subgraph) in &spec.subgraphs {
        let entry = SubgraphEntry {
            schema_name: name.clone(),
            schema: Some(subgraph.schema.clone()),
        };
        match schemas.get(name.as_str()) {
            None => changes.added.push(entry),
            Some(current) if *current == subgraph.schema => changes.unchanged.push(entry),
            Some(_) => {
                log::debug!("Subgraph {name}: schema changed");
                changes.changed.push(entry);
            }
        }
    }

    for name in remote.iter().filter(|n| !spec.subgraphs.contains_key(*n)) {
        changes.unreferenced.push(SubgraphEntry {
            schema_name: name.clone(),
            schema: None,
        });
    }

    Ok(changes)
}

fn compare_webhooks(
    spec: &Spec,
    gateway: &dyn Gateway,
) -> Result<ResourceStateChanges<WebhookEntry>> {
    let remote = gateway::webhook_dictionary(gateway).map_err(|e| Error::fetch("webhooks", e))?;

    let mut changes = ResourceStateChanges::default();
    for (name, webhook) in &spec.webhooks {
        let Some(current) = remote.get(name) else {
            changes.added.push(WebhookEntry {
                webhook_name: name.clone(),
                url: webhook.url.clone(),
                secret: Some(webhook.secret.clone()),
                webhook_id: None,
                changes: vec![],
            });
            continue;
        };

        let mut detected = Vec::new();
        if current.url != webhook.url {
            detected.push(WebhookChange::Url {
                current: current.url.clone(),
            });
        }
        if current.secret.as_deref() != Some(webhook.secret.as_str()) {
            detected.push(WebhookChange::Secret);
        }

        let entry = WebhookEntry {
            webhook_name: name.clone(),
            url: webhook.url.clone(),
            secret: Some(webhook.secret.clone()),
            webhook_id: Some(current.webhook_id.clone()),
            changes: detected,
        };
        if entry.changes.is_empty() {
            changes.unchanged.push(entry);
        } else {
            log::debug!("Webhook {name}: {} change(s)", entry.changes.len());
            changes.changed.push(entry);
        }
    }

    for (name, current) in remote.iter().filter(|(n, _)| !spec.webhooks.contains_key(*n)) {
        changes.unreferenced.push(WebhookEntry {
            webhook_name: name.clone(),
            url: current.url.clone(),
            secret: current.secret.clone(),
            webhook_id: Some(current.webhook_id.clone()),
            changes: vec![],
        });
    }

    Ok(changes)
}

/// Check that a function has triggers and that each one is well formed.
pub fn validate_triggers(function_name: &str, triggers: &[Trigger]) -> Result<()> {
    if triggers.is_empty() {
        return Err(Error::Validation(format!(
            "Function {function_name} has no triggers defined"
        )));
    }
    for t in triggers {
        trigger::validate(t).map_err(|e| {
            Error::Validation(format!("Function {function_name} has an invalid trigger: {e}"))
        })?;
    }
    Ok(())
}

/// List what differs between a deployed function and its declaration.
pub fn function_changes(
    remote: &RemoteFunction,
    remote_code: &str,
    spec: &FunctionSpec,
    webhook_id: Option<&str>,
) -> Vec<FunctionChange> {
    let mut changes = Vec::new();
    if !code_equals(remote_code, &spec.code) {
        changes.push(FunctionChange::Code);
    }
    if !trigger_set_equals(&remote.triggers, &spec.triggers) {
        changes.push(FunctionChange::Triggers);
    }
    if webhook_id != Some(remote.webhook_id.as_str()) {
        changes.push(FunctionChange::Webhook);
    }
    if should_send_std_streams(remote.should_send_std_streams)
        != should_send_std_streams(spec.should_send_std_streams)
    {
        changes.push(FunctionChange::ShouldSendStdStreams);
    }
    if remote.chain_id != spec.chain_id {
        changes.push(FunctionChange::ChainId);
    }
    if spec.is_enabled.is_some_and(|enabled| enabled != remote.is_enabled) {
        changes.push(FunctionChange::IsEnabled);
    }
    changes
}

fn compare_functions(
    spec: &Spec,
    gateway: &dyn Gateway,
    computed: &StateComparisonResult,
) -> Result<ResourceStateChanges<FunctionEntry>> {
    let remote =
        gateway::function_dictionary(gateway).map_err(|e| Error::fetch("functions", e))?;

    // Resolve references before any code is fetched.
    let mut webhook_ids = HashMap::new();
    for (name, function) in &spec.functions {
        let webhook = computed.webhook_by_name(&function.webhook).ok_or_else(|| {
            Error::Reference(format!(
                "Function {name} references a webhook that does not exist: {}",
                function.webhook
            ))
        })?;
        webhook_ids.insert(name.as_str(), webhook.webhook_id.clone());
    }
    let mut webhook_names = HashMap::new();
    for (name, function) in &remote {
        let webhook = computed.webhook_by_id(&function.webhook_id).ok_or_else(|| {
            Error::Reference(format!(
                "Function {name} references a webhook that does not exist: {}",
                function.webhook_id
            ))
        })?;
        webhook_names.insert(name.as_str(), webhook.webhook_name.clone());
    }

    let deployed: Vec<&RemoteFunction> = spec
        .functions
        .keys()
        .filter_map(|name| remote.get(name))
        .collect();
    let codes: HashMap<&str, String> = deployed
        .par_iter()
        .map(|function| {
            gateway
                .function_code(&function.function_id)
                .map(|code| (function.function_name.as_str(), code))
                .map_err(|e| Error::fetch(format!("code for function {}", function.function_name), e))
        })
        .collect::<Result<_>>()?;

    let mut changes = ResourceStateChanges::default();
    for (name, function) in &spec.functions {
        let webhook_id = webhook_ids.get(name.as_str()).cloned().flatten();
        let mut entry = FunctionEntry {
            function_name: name.clone(),
            function_id: None,
            chain_id: function.chain_id.clone(),
            triggers: function.triggers.clone(),
            webhook: function.webhook.clone(),
            webhook_id,
            code: Some(function.code.clone()),
            is_enabled: function.is_enabled,
            should_send_std_streams: should_send_std_streams(function.should_send_std_streams),
            description: function.description.clone(),
            changes: vec![],
        };

        let Some(current) = remote.get(name) else {
            validate_triggers(name, &function.triggers)?;
            changes.added.push(entry);
            continue;
        };

        let remote_code = codes.get(name.as_str()).map_or("", String::as_str);
        entry.function_id = Some(current.function_id.clone());
        entry.changes = function_changes(current, remote_code, function, entry.webhook_id.as_deref());

        if entry.changes.is_empty() {
            changes.unchanged.push(entry);
        } else {
            if entry.changes.contains(&FunctionChange::Triggers) {
                validate_triggers(name, &function.triggers)?;
            }
            log::debug!(
                "Function {name}: {}",
                entry
                    .changes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            changes.changed.push(entry);
        }
    }

    for (name, current) in remote.iter().filter(|(n, _)| !spec.functions.contains_key(*n)) {
        changes.unreferenced.push(FunctionEntry {
            function_name: name.clone(),
            function_id: Some(current.function_id.clone()),
            chain_id: current.chain_id.clone(),
            triggers: current.triggers.clone(),
            webhook: webhook_names.get(name.as_str()).cloned().unwrap_or_default(),
            webhook_id: Some(current.webhook_id.clone()),
            code: None,
            is_enabled: Some(current.is_enabled),
            should_send_std_streams: should_send_std_streams(current.should_send_std_streams),
            description: current.description.clone(),
            changes: vec![],
        });
    }

    Ok(changes)
}

/// Counts per bucket across all kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub added: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub unreferenced: usize,
}

impl DiffSummary {
    pub fn from_result(result: &StateComparisonResult) -> Self {
        let mut summary = Self::default();
        summary.add(&result.subgraphs);
        summary.add(&result.webhooks);
        summary.add(&result.functions);
        summary
    }

    fn add<T>(&mut self, changes: &ResourceStateChanges<T>) {
        self.added += changes.added.len();
        self.changed += changes.changed.len();
        self.unchanged += changes.unchanged.len();
        self.unreferenced += changes.unreferenced.len();
    }

    /// Check if there is anything to deploy
    pub fn has_changes(&self) -> bool {
        self.added + self.changed > 0
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} unchanged, {} unreferenced",
            self.added, self.changed, self.unchanged, self.unreferenced
        )
    }
}

/// Names of every resource of one kind, as a set. Used to check the
/// partition property.
pub fn bucket_names<T: crate::types::Named>(changes: &ResourceStateChanges<T>) -> BTreeSet<String> {
    changes.iter().map(|e| e.name().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::encode;
    use crate::gateway::{Call, MockGateway};
    use crate::trigger::VALID_LOCATIONS;
    use crate::types::{RemoteWebhook, SubgraphSpec, WebhookSpec};

    fn address(addr: &str, locations: Option<&[&str]>) -> Trigger {
        Trigger::Address {
            address: addr.to_string(),
            locations: locations.map(|l| l.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    fn webhook_spec(url: &str) -> WebhookSpec {
        WebhookSpec {
            url: url.to_string(),
            secret: "s".to_string(),
        }
    }

    fn function_spec(webhook: &str, code: &[u8], triggers: Vec<Trigger>) -> FunctionSpec {
        FunctionSpec {
            chain_id: "CHAIN_ETH_MAINNET".to_string(),
            triggers,
            webhook: webhook.to_string(),
            code: encode(code),
            is_enabled: None,
            should_send_std_streams: None,
            description: None,
        }
    }

    fn remote_webhook(name: &str, id: &str, url: &str) -> RemoteWebhook {
        RemoteWebhook {
            webhook_id: id.to_string(),
            webhook_name: name.to_string(),
            url: url.to_string(),
            secret: Some("s".to_string()),
        }
    }

    fn remote_function(name: &str, id: &str, webhook_id: &str, triggers: Vec<Trigger>) -> RemoteFunction {
        RemoteFunction {
            function_id: id.to_string(),
            function_name: name.to_string(),
            chain_id: "CHAIN_ETH_MAINNET".to_string(),
            triggers,
            webhook_id: webhook_id.to_string(),
            is_enabled: true,
            should_send_std_streams: Some(true),
            description: None,
        }
    }

    fn run(spec: &Spec, mock: &MockGateway) -> Result<StateComparisonResult> {
        compare(spec, mock, &CompareOptions::default())
    }

    #[test]
    fn test_new_webhook_is_added() {
        let mut spec = Spec::default();
        spec.webhooks.insert("W1".to_string(), webhook_spec("https://a"));

        let result = run(&spec, &MockGateway::new()).unwrap();
        assert_eq!(
            result.webhooks.added,
            vec![WebhookEntry {
                webhook_name: "W1".to_string(),
                url: "https://a".to_string(),
                secret: Some("s".to_string()),
                webhook_id: None,
                changes: vec![],
            }]
        );
        assert!(result.webhooks.changed.is_empty());
    }

    #[test]
    fn test_webhook_changes_recorded() {
        let mock = MockGateway::new();
        mock.add_webhook(RemoteWebhook {
            secret: Some("old".to_string()),
            ..remote_webhook("W1", "w-1", "https://old")
        });

        let mut spec = Spec::default();
        spec.webhooks.insert("W1".to_string(), webhook_spec("https://new"));

        let result = run(&spec, &mock).unwrap();
        let entry = &result.webhooks.changed[0];
        assert_eq!(entry.webhook_id.as_deref(), Some("w-1"));
        assert!(entry.secret_changed());
        assert_eq!(
            entry.changes[0],
            WebhookChange::Url {
                current: "https://old".to_string()
            }
        );
    }

    #[test]
    fn test_trigger_location_superset_is_changed() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("W", "w-1", "https://a"));
        mock.add_function(
            remote_function(
                "F1",
                "f-1",
                "w-1",
                vec![address("0xabc", Some(&["log_topic", "storage_key"]))],
            ),
            encode(b"hello"),
        );

        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions.insert(
            "F1".to_string(),
            function_spec("W", b"hello", vec![address("0xABC", Some(&["log_topic"]))]),
        );

        let result = run(&spec, &mock).unwrap();
        assert_eq!(result.functions.changed.len(), 1);
        assert_eq!(result.functions.changed[0].changes, vec![FunctionChange::Triggers]);
    }

    #[test]
    fn test_all_locations_matches_omitted_locations() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("W", "w-1", "https://a"));
        mock.add_function(
            remote_function("F2", "f-2", "w-1", vec![address("0xabc", Some(&VALID_LOCATIONS[..]))]),
            encode(b"hello"),
        );

        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions.insert(
            "F2".to_string(),
            function_spec("W", b"hello", vec![address("0xABC", None)]),
        );

        let result = run(&spec, &mock).unwrap();
        assert_eq!(result.functions.unchanged.len(), 1);
        assert!(result.functions.changed.is_empty());
    }

    #[test]
    fn test_plain_text_code_comparison() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("W", "w-1", "https://a"));
        mock.add_function(
            remote_function("F", "f-1", "w-1", vec![Trigger::NewBlock {}]),
            encode(b"hello"),
        );

        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions.insert(
            "F".to_string(),
            function_spec("W", b"hello", vec![Trigger::NewBlock {}]),
        );
        assert_eq!(run(&spec, &mock).unwrap().functions.unchanged.len(), 1);

        spec.functions.insert(
            "F".to_string(),
            function_spec("W", b"hello!", vec![Trigger::NewBlock {}]),
        );
        let result = run(&spec, &mock).unwrap();
        assert_eq!(result.functions.changed[0].changes, vec![FunctionChange::Code]);
    }

    #[test]
    fn test_function_may_reference_added_webhook() {
        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions.insert(
            "F".to_string(),
            function_spec("W", b"x", vec![Trigger::NewBlock {}]),
        );

        let result = run(&spec, &MockGateway::new()).unwrap();
        assert_eq!(result.functions.added.len(), 1);
        assert!(result.functions.added[0].webhook_id.is_none());
        assert_eq!(result.functions.added[0].trigger_types(), "TRIGGER_TYPE_NEW_BLOCK");
    }

    #[test]
    fn test_unknown_webhook_reference_is_fatal() {
        let mut spec = Spec::default();
        spec.functions.insert(
            "F".to_string(),
            function_spec("ghost", b"x", vec![Trigger::NewBlock {}]),
        );

        let err = run(&spec, &MockGateway::new()).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));
        assert_eq!(
            err.to_string(),
            "Function F references a webhook that does not exist: ghost"
        );
    }

    #[test]
    fn test_remote_function_with_unknown_webhook_is_fatal() {
        let mock = MockGateway::new();
        mock.add_function(
            remote_function("orphan", "f-1", "w-gone", vec![Trigger::NewBlock {}]),
            encode(b"x"),
        );

        let err = run(&Spec::default(), &mock).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));
        assert!(err.to_string().contains("w-gone"));
    }

    #[test]
    fn test_added_function_requires_valid_triggers() {
        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions
            .insert("F".to_string(), function_spec("W", b"x", vec![]));
        let err = run(&spec, &MockGateway::new()).unwrap_err();
        assert_eq!(err.to_string(), "Function F has no triggers defined");

        spec.functions.insert(
            "F".to_string(),
            function_spec("W", b"x", vec![address("", None)]),
        );
        let err = run(&spec, &MockGateway::new()).unwrap_err();
        assert!(err.to_string().starts_with("Function F has an invalid trigger: "));
    }

    #[test]
    fn test_unreferenced_function_resolves_webhook_name() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("W", "w-1", "https://a"));
        mock.add_function(
            remote_function("old", "f-1", "w-1", vec![Trigger::NewBlock {}]),
            encode(b"x"),
        );

        let result = run(&Spec::default(), &mock).unwrap();
        assert_eq!(result.functions.unreferenced[0].webhook, "W");
        assert_eq!(result.webhooks.unreferenced[0].webhook_name, "W");
        assert!(!mock.calls().contains(&Call::FunctionCode("f-1".to_string())));
    }

    #[test]
    fn test_subgraph_buckets() {
        let mock = MockGateway::new();
        mock.add_subgraph("same", encode(b"type A { id: ID! }"));
        mock.add_subgraph("edited", encode(b"type B { id: ID! }"));
        mock.add_subgraph("stale", encode(b"type C { id: ID! }"));

        let mut spec = Spec::default();
        for (name, schema) in [
            ("same", &b"type A { id: ID! }"[..]),
            ("edited", &b"type B { id: ID!, v: Int }"[..]),
            ("fresh", &b"type D { id: ID! }"[..]),
        ] {
            spec.subgraphs.insert(
                name.to_string(),
                SubgraphSpec {
                    schema: encode(schema),
                },
            );
        }

        let result = run(&spec, &mock).unwrap();
        assert_eq!(result.subgraphs.added[0].schema_name, "fresh");
        assert_eq!(result.subgraphs.changed[0].schema_name, "edited");
        assert_eq!(result.subgraphs.unchanged[0].schema_name, "same");
        assert_eq!(result.subgraphs.unreferenced[0].schema_name, "stale");
        assert!(result.webhooks.unreferenced.is_empty());
    }

    #[test]
    fn test_forbidden_subgraphs_are_added() {
        let mock = MockGateway::new();
        mock.forbid_subgraphs();
        let mut spec = Spec::default();
        spec.subgraphs.insert(
            "s".to_string(),
            SubgraphSpec {
                schema: encode(b"type A { id: ID! }"),
            },
        );

        let result = run(&spec, &mock).unwrap();
        assert_eq!(result.subgraphs.added.len(), 1);
    }

    #[test]
    fn test_code_fetch_failure_is_wrapped() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("W", "w-1", "https://a"));
        mock.add_function(
            remote_function("F", "f-1", "w-1", vec![Trigger::NewBlock {}]),
            encode(b"x"),
        );
        mock.fail_on("f-1");

        let mut spec = Spec::default();
        spec.webhooks.insert("W".to_string(), webhook_spec("https://a"));
        spec.functions.insert(
            "F".to_string(),
            function_spec("W", b"x", vec![Trigger::NewBlock {}]),
        );

        let err = run(&spec, &mock).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        assert_eq!(
            err.to_string(),
            "Error occurred while fetching code for function F: 500 injected failure for f-1"
        );
    }

    #[test]
    fn test_partition_and_idempotence() {
        let mock = MockGateway::new();
        mock.add_webhook(remote_webhook("keep", "w-1", "https://keep"));
        mock.add_webhook(remote_webhook("moved", "w-2", "https://old"));
        mock.add_webhook(remote_webhook("stale", "w-3", "https://stale"));
        mock.add_function(
            remote_function("same", "f-1", "w-1", vec![Trigger::NewBlock {}]),
            encode(b"a"),
        );
        mock.add_function(
            remote_function("edited", "f-2", "w-1", vec![Trigger::NewBlock {}]),
            encode(b"b"),
        );
        mock.add_function(
            remote_function("gone", "f-3", "w-3", vec![Trigger::NewBlock {}]),
            encode(b"c"),
        );

        let mut spec = Spec::default();
        spec.webhooks.insert("keep".to_string(), webhook_spec("https://keep"));
        spec.webhooks.insert("moved".to_string(), webhook_spec("https://new"));
        spec.webhooks.insert("fresh".to_string(), webhook_spec("https://fresh"));
        spec.functions.insert(
            "same".to_string(),
            function_spec("keep", b"a", vec![Trigger::NewBlock {}]),
        );
        spec.functions.insert(
            "edited".to_string(),
            function_spec("keep", b"b2", vec![Trigger::NewBlock {}]),
        );
        spec.functions.insert(
            "fresh".to_string(),
            function_spec("fresh", b"d", vec![Trigger::NewBlock {}]),
        );

        let first = run(&spec, &mock).unwrap();
        let second = run(&spec, &mock).unwrap();
        assert_eq!(first, second);

        for (changes_len, names, expected) in [
            (
                first.webhooks.len(),
                bucket_names(&first.webhooks),
                vec!["fresh", "keep", "moved", "stale"],
            ),
            (
                first.functions.len(),
                bucket_names(&first.functions),
                vec!["edited", "fresh", "gone", "same"],
            ),
        ] {
            assert_eq!(changes_len, expected.len());
            assert_eq!(names.into_iter().collect::<Vec<_>>(), expected);
        }

        assert_eq!(
            DiffSummary::from_result(&first).to_string(),
            "2 added, 2 changed, 2 unchanged, 2 unreferenced"
        );
    }

    #[test]
    fn test_is_enabled_only_compared_when_declared() {
        let remote = RemoteFunction {
            is_enabled: false,
            ..remote_function("F", "f-1", "w-1", vec![Trigger::NewBlock {}])
        };
        let mut spec = function_spec("W", b"x", vec![Trigger::NewBlock {}]);
        let code = encode(b"x");

        assert!(function_changes(&remote, &code, &spec, Some("w-1")).is_empty());

        spec.is_enabled = Some(true);
        assert_eq!(
            function_changes(&remote, &code, &spec, Some("w-1")),
            vec![FunctionChange::IsEnabled]
        );
    }

    #[test]
    fn test_std_streams_default_matches_remote_true() {
        let remote = remote_function("F", "f-1", "w-1", vec![Trigger::NewBlock {}]);
        let mut spec = function_spec("W", b"x", vec![Trigger::NewBlock {}]);
        let code = encode(b"x");
        assert!(function_changes(&remote, &code, &spec, Some("w-1")).is_empty());

        spec.should_send_std_streams = Some(false);
        spec.chain_id = "CHAIN_BASE_MAINNET".to_string();
        assert_eq!(
            function_changes(&remote, &code, &spec, Some("w-2")),
            vec![
                FunctionChange::Webhook,
                FunctionChange::ShouldSendStdStreams,
                FunctionChange::ChainId
            ]
        );
    }
}
