//! Remote resource gateway.
//!
//! The [`Gateway`] trait is the only way the diff engine and the
//! orchestrators talk to the API. [`http::HttpGateway`] is the real client;
//! [`MockGateway`] keeps everything in memory and records every call.
//!
//! # Testing
//!
//! ```
//! use reconcile::gateway::{Gateway, MockGateway, webhook_dictionary};
//! use reconcile::RemoteWebhook;
//!
//! let mock = MockGateway::new();
//! mock.add_webhook(RemoteWebhook {
//!     webhook_id: "w-1".to_string(),
//!     webhook_name: "alerts".to_string(),
//!     url: "https://example.com/hook".to_string(),
//!     secret: Some("s3cret".to_string()),
//! });
//!
//! let webhooks = webhook_dictionary(&mock).unwrap();
//! assert!(webhooks.contains_key("alerts"));
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    CreateFunction, CreateSubgraph, CreateWebhook, Page, PatchFunction, RemoteFunction,
    RemoteWebhook, ReplayBlocks,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Access to remote state.
///
/// Listing methods take a 1-based page number. Mutations return the
/// server-assigned id where the API provides one.
pub trait Gateway: Send + Sync {
    fn list_webhooks(&self, page: u32) -> Result<Page<RemoteWebhook>>;
    fn create_webhook(&self, request: &CreateWebhook) -> Result<String>;
    fn delete_webhook(&self, webhook_id: &str) -> Result<()>;

    fn list_functions(&self, page: u32) -> Result<Page<RemoteFunction>>;
    /// Base64 code of a deployed function.
    fn function_code(&self, function_id: &str) -> Result<String>;
    fn create_function(&self, request: &CreateFunction) -> Result<String>;
    fn patch_function(&self, function_id: &str, request: &PatchFunction) -> Result<()>;
    fn delete_function(&self, function_id: &str) -> Result<()>;
    fn replay_blocks(&self, request: &ReplayBlocks) -> Result<()>;

    /// Subgraph listings only carry schema names.
    fn list_subgraphs(&self, page: u32) -> Result<Page<String>>;
    /// Base64 schema of a deployed subgraph.
    fn subgraph_schema(&self, name: &str) -> Result<String>;
    fn create_subgraph(&self, request: &CreateSubgraph) -> Result<()>;
    fn delete_subgraph(&self, name: &str) -> Result<()>;
}

/// Collect every item of a paginated listing.
///
/// Pages are requested from 1 until the server reports `page >= pages`.
pub fn fetch_all<T>(mut fetch: impl FnMut(u32) -> Result<Page<T>>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let response = fetch(page)?;
        log::debug!(
            "Fetched page {} of {} ({} items)",
            response.page,
            response.pages,
            response.items.len()
        );
        items.extend(response.items);
        if response.page >= response.pages {
            break;
        }
        page += 1;
    }
    Ok(items)
}

/// Deployed webhooks keyed by name.
pub fn webhook_dictionary(gateway: &dyn Gateway) -> Result<BTreeMap<String, RemoteWebhook>> {
    let webhooks = fetch_all(|page| gateway.list_webhooks(page))?;
    Ok(webhooks
        .into_iter()
        .map(|w| (w.webhook_name.clone(), w))
        .collect())
}

/// Deployed functions keyed by name.
pub fn function_dictionary(gateway: &dyn Gateway) -> Result<BTreeMap<String, RemoteFunction>> {
    let functions = fetch_all(|page| gateway.list_functions(page))?;
    Ok(functions
        .into_iter()
        .map(|f| (f.function_name.clone(), f))
        .collect())
}

/// Names of deployed subgraphs.
///
/// Accounts without subgraph access get a 403; that is treated as having
/// no subgraphs at all.
pub fn subgraph_names(gateway: &dyn Gateway, warn_on_forbidden: bool) -> Result<BTreeSet<String>> {
    match fetch_all(|page| gateway.list_subgraphs(page)) {
        Ok(names) => Ok(names.into_iter().collect()),
        Err(e) if e.status() == Some(403) => {
            if warn_on_forbidden {
                log::warn!(
                    "Access to subgraphs is forbidden. If you wish to deploy subgraphs, please request the necessary permissions for your API key."
                );
            }
            Ok(BTreeSet::new())
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Mock gateway
// =============================================================================

/// A gateway call, as recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListWebhooks(u32),
    CreateWebhook(String),
    DeleteWebhook(String),
    ListFunctions(u32),
    FunctionCode(String),
    CreateFunction(String),
    PatchFunction(String),
    DeleteFunction(String),
    ReplayBlocks(String),
    ListSubgraphs(u32),
    SubgraphSchema(String),
    CreateSubgraph(String),
    DeleteSubgraph(String),
}

impl Call {
    /// Whether this call changes remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateWebhook(_)
                | Self::DeleteWebhook(_)
                | Self::CreateFunction(_)
                | Self::PatchFunction(_)
                | Self::DeleteFunction(_)
                | Self::ReplayBlocks(_)
                | Self::CreateSubgraph(_)
                | Self::DeleteSubgraph(_)
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    webhooks: Vec<RemoteWebhook>,
    functions: Vec<RemoteFunction>,
    code: HashMap<String, String>,
    subgraphs: BTreeMap<String, String>,
    subgraphs_forbidden: bool,
    failing: HashSet<String>,
    calls: Vec<Call>,
    next_id: usize,
}

impl MockState {
    fn record(&mut self, call: Call) {
        self.calls.push(call);
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.contains(key) {
            return Err(Error::Api {
                status: 500,
                body: format!("injected failure for {key}"),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory gateway for tests.
///
/// Mutations update the stored state, so a deploy followed by a fresh diff
/// sees the new resources. Listings are served in pages of
/// [`MockGateway::PAGE_SIZE`] to exercise pagination.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub const PAGE_SIZE: usize = 2;

    /// Create a new empty mock gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_webhook(&self, webhook: RemoteWebhook) {
        self.state().webhooks.push(webhook);
    }

    /// Add a deployed function along with its code.
    pub fn add_function(&self, function: RemoteFunction, code: impl Into<String>) {
        let mut state = self.state();
        state.code.insert(function.function_id.clone(), code.into());
        state.functions.push(function);
    }

    pub fn add_subgraph(&self, name: impl Into<String>, schema: impl Into<String>) {
        self.state().subgraphs.insert(name.into(), schema.into());
    }

    /// Answer subgraph listings with 403.
    pub fn forbid_subgraphs(&self) {
        self.state().subgraphs_forbidden = true;
    }

    /// Make every call that targets `key` (a name or an id) fail.
    pub fn fail_on(&self, key: impl Into<String>) {
        self.state().failing.insert(key.into());
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Only the calls that change remote state.
    pub fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn webhooks(&self) -> Vec<RemoteWebhook> {
        self.state().webhooks.clone()
    }

    pub fn functions(&self) -> Vec<RemoteFunction> {
        self.state().functions.clone()
    }

    pub fn subgraphs(&self) -> Vec<String> {
        self.state().subgraphs.keys().cloned().collect()
    }
}

fn paginate<T: Clone>(items: &[T], page: u32) -> Page<T> {
    let pages = items.len().div_ceil(MockGateway::PAGE_SIZE).max(1);
    let start = (page as usize).saturating_sub(1) * MockGateway::PAGE_SIZE;
    let items = items
        .iter()
        .skip(start)
        .take(MockGateway::PAGE_SIZE)
        .cloned()
        .collect();
    Page {
        items,
        page,
        pages: pages as u32,
    }
}

fn not_found(what: &str) -> Error {
    Error::Api {
        status: 404,
        body: format!("{what} not found"),
    }
}

impl Gateway for MockGateway {
    fn list_webhooks(&self, page: u32) -> Result<Page<RemoteWebhook>> {
        let mut state = self.state();
        state.record(Call::ListWebhooks(page));
        Ok(paginate(&state.webhooks, page))
    }

    fn create_webhook(&self, request: &CreateWebhook) -> Result<String> {
        let mut state = self.state();
        state.record(Call::CreateWebhook(request.webhook_name.clone()));
        state.check(&request.webhook_name)?;
        let id = state.allocate_id("webhook");
        state.webhooks.push(RemoteWebhook {
            webhook_id: id.clone(),
            webhook_name: request.webhook_name.clone(),
            url: request.url.clone(),
            secret: Some(request.secret.clone()),
        });
        Ok(id)
    }

    fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        let mut state = self.state();
        state.record(Call::DeleteWebhook(webhook_id.to_string()));
        state.check(webhook_id)?;
        let before = state.webhooks.len();
        state.webhooks.retain(|w| w.webhook_id != webhook_id);
        if state.webhooks.len() == before {
            return Err(not_found("webhook"));
        }
        Ok(())
    }

    fn list_functions(&self, page: u32) -> Result<Page<RemoteFunction>> {
        let mut state = self.state();
        state.record(Call::ListFunctions(page));
        Ok(paginate(&state.functions, page))
    }

    fn function_code(&self, function_id: &str) -> Result<String> {
        let mut state = self.state();
        state.record(Call::FunctionCode(function_id.to_string()));
        state.check(function_id)?;
        state
            .code
            .get(function_id)
            .cloned()
            .ok_or_else(|| not_found("function code"))
    }

    fn create_function(&self, request: &CreateFunction) -> Result<String> {
        let mut state = self.state();
        state.record(Call::CreateFunction(request.function_name.clone()));
        state.check(&request.function_name)?;
        let id = state.allocate_id("function");
        state.code.insert(id.clone(), request.function_code.clone());
        state.functions.push(RemoteFunction {
            function_id: id.clone(),
            function_name: request.function_name.clone(),
            chain_id: request.chain_id.clone(),
            triggers: request.triggers.clone(),
            webhook_id: request.webhook_id.clone(),
            is_enabled: request.is_enabled.unwrap_or(true),
            should_send_std_streams: Some(request.should_send_std_streams),
            description: request.description.clone(),
        });
        Ok(id)
    }

    fn patch_function(&self, function_id: &str, request: &PatchFunction) -> Result<()> {
        let mut state = self.state();
        state.record(Call::PatchFunction(function_id.to_string()));
        state.check(function_id)?;
        let Some(function) = state
            .functions
            .iter_mut()
            .find(|f| f.function_id == function_id)
        else {
            return Err(not_found("function"));
        };
        function.chain_id = request.chain_id.clone();
        function.triggers = request.triggers.clone();
        function.webhook_id = request.webhook_id.clone();
        function.should_send_std_streams = Some(request.should_send_std_streams);
        if let Some(enabled) = request.is_enabled {
            function.is_enabled = enabled;
        }
        if request.description.is_some() {
            function.description = request.description.clone();
        }
        state
            .code
            .insert(function_id.to_string(), request.function_code.clone());
        Ok(())
    }

    fn delete_function(&self, function_id: &str) -> Result<()> {
        let mut state = self.state();
        state.record(Call::DeleteFunction(function_id.to_string()));
        state.check(function_id)?;
        let before = state.functions.len();
        state.functions.retain(|f| f.function_id != function_id);
        if state.functions.len() == before {
            return Err(not_found("function"));
        }
        state.code.remove(function_id);
        Ok(())
    }

    fn replay_blocks(&self, request: &ReplayBlocks) -> Result<()> {
        let mut state = self.state();
        state.record(Call::ReplayBlocks(request.chain_id.clone()));
        state.check(&request.chain_id)
    }

    fn list_subgraphs(&self, page: u32) -> Result<Page<String>> {
        let mut state = self.state();
        state.record(Call::ListSubgraphs(page));
        if state.subgraphs_forbidden {
            return Err(Error::Api {
                status: 403,
                body: "Forbidden".to_string(),
            });
        }
        let names: Vec<String> = state.subgraphs.keys().cloned().collect();
        Ok(paginate(&names, page))
    }

    fn subgraph_schema(&self, name: &str) -> Result<String> {
        let mut state = self.state();
        state.record(Call::SubgraphSchema(name.to_string()));
        state.check(name)?;
        state
            .subgraphs
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("subgraph"))
    }

    fn create_subgraph(&self, request: &CreateSubgraph) -> Result<()> {
        let mut state = self.state();
        state.record(Call::CreateSubgraph(request.name.clone()));
        state.check(&request.name)?;
        state
            .subgraphs
            .insert(request.name.clone(), request.schema.clone());
        Ok(())
    }

    fn delete_subgraph(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.record(Call::DeleteSubgraph(name.to_string()));
        state.check(name)?;
        state
            .subgraphs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("subgraph"))
    }
}
