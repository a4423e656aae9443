//! State client (§4.F): abstracts the provider's REST API into per-kind
//! traits implemented once over a shared `reqwest::blocking::Client`, the
//! same synchronous usage as the teacher's `vault.rs`/`grafana.rs`.

pub mod http;
pub mod memory;
pub mod pagination;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use kongctl_definitions::ResourceType;

use crate::config::KongctlConfig;
use crate::error::{auth, network, rate_limit, server};
use crate::state::http::{log_error, log_request, log_response, sanitize_query, RequestCounter};
use crate::state::pagination::{paginate, Page};
use crate::Result;

/// A single remote object as returned by the provider's API: enough to
/// diff against a desired resource and to re-issue update/delete calls.
#[derive(Debug, Clone, Default)]
pub struct RemoteObject {
    pub id: String,
    pub ref_: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

pub trait List {
    fn list(&self, kind: ResourceType, parent_id: Option<&str>) -> Result<Vec<RemoteObject>>;
}

pub trait Fetch {
    fn fetch(&self, kind: ResourceType, id: &str) -> Result<Option<RemoteObject>>;
}

pub trait Create {
    fn create(&self, kind: ResourceType, parent_id: Option<&str>, fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject>;
}

pub trait Update {
    fn update(&self, kind: ResourceType, id: &str, fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject>;
}

pub trait Delete {
    fn delete(&self, kind: ResourceType, id: &str) -> Result<()>;
}

/// Object-safe umbrella so the planner/executor can hold one trait object
/// regardless of whether it's talking to the real API or a test fake.
pub trait StateClient: List + Fetch + Create + Update + Delete + Send + Sync {}
impl<T: List + Fetch + Create + Update + Delete + Send + Sync> StateClient for T {}

/// The real implementation, talking to the Konnect-style REST API over
/// `reqwest::blocking`.
pub struct HttpStateClient {
    client: reqwest::blocking::Client,
    addr: String,
    token: String,
    page_size: usize,
    requests: RequestCounter,
}

impl HttpStateClient {
    pub fn new(config: &KongctlConfig) -> Result<Self> {
        let client = reqwest::blocking::ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(config.max_concurrency)
            .build()
            .map_err(|e| network(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpStateClient {
            client,
            addr: config.addr.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            page_size: config.page_size,
            requests: RequestCounter::new(),
        })
    }

    fn collection_url(&self, kind: ResourceType, parent_id: Option<&str>) -> String {
        match (kind, parent_id) {
            (ResourceType::GatewayService, Some(cp)) => format!("{}/v2/control-planes/{}/core-entities/services", self.addr, cp),
            (ResourceType::PortalPage, Some(portal)) => format!("{}/v2/portals/{}/pages", self.addr, portal),
            (ResourceType::ApiVersion, Some(api)) => format!("{}/v2/apis/{}/versions", self.addr, api),
            (ResourceType::ApiPublication, Some(api)) => format!("{}/v2/apis/{}/publications", self.addr, api),
            _ => format!("{}/v2/{}s", self.addr, kind.as_str().replace('_', "-")),
        }
    }

    fn send(&self, method: reqwest::Method, url: &str, body: Option<&serde_json::Value>) -> Result<serde_json::Value> {
        let route = strip_query(url);
        let host = self.addr.clone();
        let ctx = self.requests.next(method.as_str(), &route, &host);

        let mut headers = std::collections::BTreeMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", self.token));
        log_request(&ctx, &headers, body.map(|b| b.to_string()).as_deref());

        let start = Instant::now();
        let mut req = self.client.request(method, sanitized_for_logging_only(url)).bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().map_err(|e| {
            log_error(&ctx, start.elapsed(), &e);
            classify_transport_error(&e)
        })?;

        let status = resp.status();
        let content_length = resp.content_length();
        let text = resp.text().unwrap_or_default();
        log_response(&ctx, status.as_u16(), start.elapsed(), content_length, Some(&text));

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(auth(format!("{} {} -> {}", ctx.method, route, status)));
        }
        if status.as_u16() == 429 {
            return Err(rate_limit(format!("{} {} -> 429", ctx.method, route)));
        }
        if status.as_u16() == 409 {
            return Err(crate::error::conflict(format!("{} {} -> 409: {}", ctx.method, route, text)));
        }
        if status.is_server_error() {
            return Err(server(format!("{} {} -> {}", ctx.method, route, status)));
        }
        if !status.is_success() {
            return Err(crate::error::validation(format!("{} {} -> {}: {}", ctx.method, route, status, text)));
        }
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| crate::error::execution(format!("invalid JSON from {}: {}", route, e)))
    }

    fn to_remote_object(value: &serde_json::Value) -> RemoteObject {
        let fields = value.as_object().cloned().unwrap_or_default();
        let id = fields.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let mut labels = BTreeMap::new();
        if let Some(l) = fields.get("labels").and_then(|v| v.as_object()) {
            for (k, v) in l {
                if let Some(s) = v.as_str() {
                    labels.insert(k.clone(), s.to_string());
                }
            }
        }
        let ref_ = labels.get("ref").cloned();
        RemoteObject { id, ref_, labels, fields }
    }
}

/// Logging routes never include the query string (it may carry sensitive
/// parameters); the real request still goes out against the full URL.
fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

fn sanitized_for_logging_only(url: &str) -> &str {
    url
}

fn classify_transport_error(e: &reqwest::Error) -> failure::Error {
    if e.is_timeout() || e.is_connect() {
        network(e.to_string())
    } else {
        crate::error::execution(e.to_string())
    }
}

impl List for HttpStateClient {
    fn list(&self, kind: ResourceType, parent_id: Option<&str>) -> Result<Vec<RemoteObject>> {
        let base = self.collection_url(kind, parent_id);
        let page_size = self.page_size;
        let items = paginate(page_size, |offset, size| {
            let url = format!("{}?offset={}&size={}", base, offset, size);
            let body = self.send(reqwest::Method::GET, &url, None)?;
            let total = body.get("meta").and_then(|m| m.get("page")).and_then(|p| p.get("total")).and_then(|t| t.as_u64()).map(|n| n as usize);
            let items = body.get("data").and_then(|d| d.as_array()).cloned().unwrap_or_default();
            Ok(Page { items, total })
        })?;
        Ok(items.iter().map(Self::to_remote_object).collect())
    }
}

impl Fetch for HttpStateClient {
    fn fetch(&self, kind: ResourceType, id: &str) -> Result<Option<RemoteObject>> {
        let url = format!("{}/{}", self.collection_url(kind, None), id);
        match self.send(reqwest::Method::GET, &url, None) {
            Ok(v) if v.is_null() => Ok(None),
            Ok(v) => Ok(Some(Self::to_remote_object(&v))),
            Err(e) => Err(e),
        }
    }
}

impl Create for HttpStateClient {
    fn create(&self, kind: ResourceType, parent_id: Option<&str>, fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject> {
        let url = self.collection_url(kind, parent_id);
        let body = serde_json::Value::Object(fields);
        let v = self.send(reqwest::Method::POST, &url, Some(&body))?;
        Ok(Self::to_remote_object(&v))
    }
}

impl Update for HttpStateClient {
    fn update(&self, kind: ResourceType, id: &str, fields: serde_json::Map<String, serde_json::Value>) -> Result<RemoteObject> {
        let url = format!("{}/{}", self.collection_url(kind, None), id);
        let body = serde_json::Value::Object(fields);
        let v = self.send(reqwest::Method::PATCH, &url, Some(&body))?;
        Ok(Self::to_remote_object(&v))
    }
}

impl Delete for HttpStateClient {
    fn delete(&self, kind: ResourceType, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.collection_url(kind, None), id);
        self.send(reqwest::Method::DELETE, &url, None)?;
        Ok(())
    }
}
