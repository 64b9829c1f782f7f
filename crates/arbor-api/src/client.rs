// Tree API HTTP client
//
// Wraps `reqwest::Client` with endpoint construction and response
// decoding for the four tree operations. Every method is a single
// best-effort request: no retries, no caching.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{RawTreeResponse, ServiceError, TreeResponse};
use crate::transport::TransportConfig;

/// Default endpoint namespace of the reference service.
pub const DEFAULT_NAMESPACE: &str = "api.user";

const BODY_PREVIEW: usize = 200;

/// Stateless HTTP client for a remote tree service.
///
/// Endpoints are laid out as `{base_url}/{namespace}.{operation}` and all
/// operations are query-parameter GET requests. Mutations return as soon
/// as the service acknowledges them; callers must re-fetch the tree to
/// observe the effect.
#[derive(Debug, Clone)]
pub struct TreeClient {
    http: reqwest::Client,
    base_url: Url,
    namespace: String,
}

impl TreeClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    /// Override the endpoint namespace (e.g. `api.admin`).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The endpoint namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the whole tree: root id plus every node beneath it.
    pub async fn fetch_tree(&self, tree_name: &str) -> Result<TreeResponse, Error> {
        let url = self.endpoint("tree.get", &[("treeName", tree_name)])?;
        let raw: RawTreeResponse = self.get_json(url).await?;
        TreeResponse::try_from(raw)
    }

    /// Create `name` as the last child of `parent_id`.
    pub async fn create_node(
        &self,
        tree_name: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<(), Error> {
        let url = self.endpoint(
            "tree.node.create",
            &[
                ("treeName", tree_name),
                ("parentNodeId", parent_id),
                ("nodeName", name),
            ],
        )?;
        self.get_ack(url).await
    }

    /// Rename `node_id` to `new_name`.
    pub async fn rename_node(
        &self,
        tree_name: &str,
        node_id: &str,
        new_name: &str,
    ) -> Result<(), Error> {
        let url = self.endpoint(
            "tree.node.rename",
            &[
                ("treeName", tree_name),
                ("nodeId", node_id),
                ("newNodeName", new_name),
            ],
        )?;
        self.get_ack(url).await
    }

    /// Delete `node_id`. The service removes the whole subtree.
    pub async fn delete_node(&self, tree_name: &str, node_id: &str) -> Result<(), Error> {
        let url = self.endpoint(
            "tree.node.delete",
            &[("treeName", tree_name), ("nodeId", node_id)],
        )?;
        self.get_ack(url).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/{namespace}.{operation}?{params}`.
    pub(crate) fn endpoint(&self, operation: &str, params: &[(&str, &str)]) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let namespace = self.namespace.trim_matches('.');
        let mut url = Url::parse(&format!("{base}/{namespace}.{operation}"))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode a JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.send(url).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// Send a GET request whose success body carries no information.
    async fn get_ack(&self, url: Url) -> Result<(), Error> {
        self.send(url).await.map(drop)
    }

    /// Send a GET request and return the body of a 2xx response.
    async fn send(&self, url: Url) -> Result<String, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), body = %preview(&body), "response");

        if status.is_success() {
            return Ok(body);
        }

        let message = match serde_json::from_str::<ServiceError>(&body) {
            Ok(err) => {
                debug!(kind = ?err.kind, "service reported an error");
                err.message()
            }
            Err(_) => None,
        }
        .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body)));

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
