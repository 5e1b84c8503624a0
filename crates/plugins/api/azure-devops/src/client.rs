//! Azure DevOps API client: connection settings and request plumbing.
//!
//! The service-specific trait implementations live in sibling modules
//! and share the helpers defined here.

use std::sync::Arc;

use azdo_core::config::Endpoints;
use azdo_core::types::Page;
use azdo_core::{Error, PatchOperation, Result, UserAgent};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::ListResponse;

/// Default REST api-version.
pub(crate) const API_VERSION: &str = "7.1";

/// Response header carrying the token of the next page.
pub(crate) const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

const JSON_PATCH: &str = "application/json-patch+json";

/// Credential presented to Azure DevOps.
#[derive(Clone)]
pub enum Credential {
    /// Personal access token, sent as Basic auth with an empty user name
    Pat(String),
    /// OAuth / Entra ID access token, sent as Bearer auth
    Bearer(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Pat(_) => f.write_str("Pat(***)"),
            Credential::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Azure DevOps API client.
pub struct AzureDevOpsClient {
    pub(crate) endpoints: Endpoints,
    credential: Credential,
    user_agent: Arc<UserAgent>,
    client: reqwest::Client,
}

impl AzureDevOpsClient {
    /// Create a client for an organization.
    ///
    /// `server_url` replaces the hosted endpoints (Azure DevOps Server).
    pub fn new(
        organization: &str,
        server_url: Option<&str>,
        credential: Credential,
        user_agent: Arc<UserAgent>,
    ) -> Self {
        Self {
            endpoints: Endpoints::new(organization, server_url),
            credential,
            user_agent,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with every service on one base URL (for testing with httpmock).
    pub fn with_base_url(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            endpoints: Endpoints::single(&base_url.into()),
            credential,
            user_agent: Arc::new(UserAgent::default()),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `{org_url}/{project}`.
    pub(crate) fn project_url(&self, project: &str) -> String {
        join_path(&self.endpoints.org_url, &[project])
    }

    /// `{org_url}/{project}` or `{org_url}` when no project is given.
    pub(crate) fn scope_url(&self, project: Option<&str>) -> String {
        match project.filter(|p| !p.is_empty()) {
            Some(project) => self.project_url(project),
            None => self.endpoints.org_url.clone(),
        }
    }

    /// Build request with auth and user agent headers.
    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let authorization = match &self.credential {
            Credential::Pat(pat) => format!("Basic {}", base64_encode(&format!(":{}", pat))),
            Credential::Bearer(token) => format!("Bearer {}", token),
        };

        self.client
            .request(method, url)
            .header("Authorization", authorization)
            .header("User-Agent", self.user_agent.get())
            .header("Accept", "application/json")
    }

    /// Send a request and map transport and status errors.
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Azure DevOps API error response"
            );
            let message = if message.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                message
            };
            return Err(Error::from_status(status_code, message));
        }

        Ok(response)
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url = url, "Azure DevOps GET request");
        let response = self
            .send(self.request(reqwest::Method::GET, url).query(query))
            .await?;
        read_json(response).await
    }

    /// GET a `{count, value}` list.
    pub(crate) async fn get_list(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<Value>> {
        let list: ListResponse = self.get(url, query).await?;
        Ok(list.value)
    }

    /// GET a list together with its continuation token header.
    pub(crate) async fn get_page(&self, url: &str, query: &[(&str, String)]) -> Result<Page> {
        debug!(url = url, "Azure DevOps GET request (paged)");
        let response = self
            .send(self.request(reqwest::Method::GET, url).query(query))
            .await?;

        let continuation_token = response
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let list: ListResponse = read_json(response).await?;
        Ok(Page {
            value: list.value,
            continuation_token,
        })
    }

    /// Make an authenticated request with a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, method = %method, "Azure DevOps request");
        let response = self.send(self.request(method, url).json(body)).await?;
        read_json(response).await
    }

    /// Make an authenticated POST request.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(reqwest::Method::POST, url, body).await
    }

    /// Send a JSON-Patch document (work item create/update).
    pub(crate) async fn send_patch_document(
        &self,
        method: reqwest::Method,
        url: &str,
        document: &[PatchOperation],
    ) -> Result<Value> {
        debug!(url = url, operations = document.len(), "Azure DevOps patch request");
        let body = serde_json::to_vec(document)?;
        let response = self
            .send(
                self.request(method, url)
                    .header("Content-Type", JSON_PATCH)
                    .body(body),
            )
            .await?;
        read_json(response).await
    }
}

/// Decode a JSON response; an empty body decodes as `null`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::Http(e.to_string()))?;
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text)
        .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
}

/// `base` with `segments` appended, each percent-encoded as one path segment.
///
/// A base that does not parse is joined verbatim and fails when sent.
pub(crate) fn join_path(base: &str, segments: &[&str]) -> String {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(_) => return format!("{}/{}", base.trim_end_matches('/'), segments.join("/")),
    };
    match url.path_segments_mut() {
        Ok(mut path) => {
            path.pop_if_empty().extend(segments);
        }
        Err(()) => return format!("{}/{}", base.trim_end_matches('/'), segments.join("/")),
    }
    url.into()
}

/// Push `name=value` onto a query when the value is set.
pub(crate) fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((name, value.to_string()));
    }
}

/// Base64-encode a string for the Basic authorization header.
fn base64_encode(input: &str) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.as_bytes().chunks(3) {
        let n = chunk
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &b)| acc | (b as u32) << (16 - 8 * i));
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[((n >> (18 - 6 * i)) & 0x3F) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }

    out
}
