//! HTTP gateway.
//!
//! Talks to the REST API under `/api/v1` with a bearer token. Any non-2xx
//! answer becomes [`Error::Api`] carrying the status and the response body.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::{
    CreateFunction, CreateSubgraph, CreateWebhook, Page, PatchFunction, RemoteFunction,
    RemoteWebhook, ReplayBlocks,
};
use serde::Deserialize;
use ureq::Body;
use ureq::http::Response;

/// Where the API lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_url: String,
    pub token: String,
}

/// Blocking HTTP client for the API.
pub struct HttpGateway {
    agent: ureq::Agent,
    api_base: String,
    authorization: String,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            api_base: format!("{}/api/v1", config.api_url.trim_end_matches('/')),
            authorization: format!("Bearer {}", config.token),
        }
    }

    /// Get the API base URL, including the version prefix.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn get(&self, path: &str, page: Option<u32>) -> Result<Response<Body>> {
        let url = self.url(path);
        log::debug!("GET {url} (page {page:?})");
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        if let Some(page) = page {
            request = request.query("page", page.to_string());
        }
        expect_success(request.call()?)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        log::debug!("DELETE {url}");
        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &self.authorization)
            .call()?;
        expect_success(response)?;
        Ok(())
    }

    fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<Response<Body>> {
        let url = self.url(path);
        log::debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.authorization)
            .send_json(body)?;
        expect_success(response)
    }
}

fn expect_success(mut response: Response<Body>) -> Result<Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.body_mut().read_to_string().unwrap_or_else(|e| {
        log::debug!("Could not read error body for {status}: {e}");
        String::new()
    });
    log::debug!("API answered {status}: {body}");
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

/// Code and schema endpoints answer with a JSON string, but tolerate raw text.
fn unquote(raw: String) -> String {
    serde_json::from_str::<String>(&raw).unwrap_or(raw)
}

#[derive(Debug, Deserialize)]
struct CreatedWebhook {
    webhook_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedFunction {
    function_id: String,
}

#[derive(Debug, Deserialize)]
struct SubgraphSchema {
    schema: String,
}

impl Gateway for HttpGateway {
    fn list_webhooks(&self, page: u32) -> Result<Page<RemoteWebhook>> {
        Ok(self.get("/webhooks", Some(page))?.body_mut().read_json()?)
    }

    fn create_webhook(&self, request: &CreateWebhook) -> Result<String> {
        let created: CreatedWebhook = self.post("/webhooks", request)?.body_mut().read_json()?;
        Ok(created.webhook_id)
    }

    fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        self.delete(&format!("/webhooks/{webhook_id}"))
    }

    fn list_functions(&self, page: u32) -> Result<Page<RemoteFunction>> {
        Ok(self.get("/functions", Some(page))?.body_mut().read_json()?)
    }

    fn function_code(&self, function_id: &str) -> Result<String> {
        let raw = self
            .get(&format!("/functions/{function_id}/code"), None)?
            .body_mut()
            .read_to_string()?;
        Ok(unquote(raw))
    }

    fn create_function(&self, request: &CreateFunction) -> Result<String> {
        let created: CreatedFunction = self.post("/functions", request)?.body_mut().read_json()?;
        Ok(created.function_id)
    }

    fn patch_function(&self, function_id: &str, request: &PatchFunction) -> Result<()> {
        let url = self.url(&format!("/functions/{function_id}"));
        log::debug!("PATCH {url}");
        let response = self
            .agent
            .patch(&url)
            .header("Authorization", &self.authorization)
            .send_json(request)?;
        expect_success(response)?;
        Ok(())
    }

    fn delete_function(&self, function_id: &str) -> Result<()> {
        self.delete(&format!("/functions/{function_id}"))
    }

    fn replay_blocks(&self, request: &ReplayBlocks) -> Result<()> {
        self.post("/functions/replay_blocks", request)?;
        Ok(())
    }

    fn list_subgraphs(&self, page: u32) -> Result<Page<String>> {
        Ok(self.get("/subgraph", Some(page))?.body_mut().read_json()?)
    }

    fn subgraph_schema(&self, name: &str) -> Result<String> {
        let schema: SubgraphSchema = self
            .get(&format!("/subgraph/schema/{name}"), None)?
            .body_mut()
            .read_json()?;
        Ok(schema.schema)
    }

    fn create_subgraph(&self, request: &CreateSubgraph) -> Result<()> {
        self.post("/subgraph/schema", request)?;
        Ok(())
    }

    fn delete_subgraph(&self, name: &str) -> Result<()> {
        self.delete(&format!("/subgraph/schema/{name}"))
    }
}
