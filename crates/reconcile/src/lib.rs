//! # Reconcile
//!
//! State reconciliation for SendBlocks functions, webhooks and subgraphs.
//!
//! This crate loads the declared state from a project's YAML files, fetches
//! the state held by the remote API, computes a per-kind diff, and applies or
//! destroys the differences in dependency order.
//!
//! ## Core Concepts
//!
//! - **Spec**: the merged, resolved contents of every YAML file in `src/`
//! - **Gateway**: the remote API (HTTP in production, in-memory in tests)
//! - **StateComparisonResult**: added / changed / unchanged / unreferenced
//!   buckets for each resource kind
//! - **Executor**: deploys (subgraphs, webhooks, functions) or destroys
//!   (functions, subgraphs, webhooks) a diff
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     compare, deploy, load_project, AutoConfirm, CompareOptions, ExecuteOptions,
//!     GatewayConfig, HttpGateway, NoProgress,
//! };
//!
//! let spec = load_project(std::path::Path::new("."))?;
//! let gateway = HttpGateway::new(&GatewayConfig {
//!     api_url: "https://api.sendblocks.io".into(),
//!     token: std::env::var("SENDBLOCKS_TOKEN")?,
//! });
//! let changes = compare(&spec, &gateway, &CompareOptions::default())?;
//! let execution = deploy(
//!     &changes,
//!     &gateway,
//!     &ExecuteOptions::deploy(),
//!     &mut NoProgress,
//!     &mut AutoConfirm,
//! )?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`Gateway`]: Remote resource access
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! The orchestrators have no terminal dependency; the CLI plugs in prompts
//! and spinners.

pub mod code;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod replay;
pub mod spec;
pub mod trigger;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{CompareOptions, DiffSummary, compare};
pub use error::{Error, ErrorCategory, Result};
pub use executor::{ExecuteOptions, Execution, Report, deploy, destroy};
pub use gateway::http::{GatewayConfig, HttpGateway};
pub use gateway::{Gateway, MockGateway};
pub use replay::{ReplayPlan, convert_hex_or_decimal, parse_block_number, plan_replay};
pub use spec::{load_project, load_raw};
pub use trigger::Trigger;
pub use types::{
    FunctionEntry, FunctionSpec, ItemResult, Outcome, RemoteFunction, RemoteWebhook,
    ResourceKind, ResourceStateChanges, Spec, StateComparisonResult, SubgraphEntry,
    SubgraphSpec, WebhookEntry, WebhookSpec,
};
