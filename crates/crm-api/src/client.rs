// Hand-crafted async HTTP client for the contacts backend.
//
// One resource collection, four endpoints:
//   GET  {base}/      list
//   GET  {base}/{id}  get
//   POST {base}/      create
//   PUT  {base}/{id}  update

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ContactRecord;
use crate::transport::TransportConfig;

/// Async client for the contacts collection.
///
/// Success is decided by the HTTP status alone. No local caching and no
/// retries happen here; `crm-core` layers both deduplication and caching
/// on top.
#[derive(Debug, Clone)]
pub struct ContactsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ContactsClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with its own `reqwest::Client` from a transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Force a trailing slash so relative joins land *under* the base path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The normalized collection URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every contact.
    ///
    /// `GET {base}/`
    pub async fn list(&self) -> Result<Vec<ContactRecord>, Error> {
        self.get_json(self.base_url.clone()).await
    }

    /// Fetch a single contact.
    ///
    /// `GET {base}/{id}`
    pub async fn get(&self, id: u64) -> Result<ContactRecord, Error> {
        let url = self.item_url(id)?;
        self.get_json(url).await
    }

    /// Create a contact; the backend assigns the id.
    ///
    /// `POST {base}/`
    pub async fn create(&self, payload: &ContactRecord) -> Result<ContactRecord, Error> {
        self.post_json(self.base_url.clone(), payload).await
    }

    /// Replace the fields of an existing contact.
    ///
    /// `PUT {base}/{id}`
    pub async fn update(&self, id: u64, payload: &ContactRecord) -> Result<ContactRecord, Error> {
        let url = self.item_url(id)?;
        self.put_json(url, payload).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    fn item_url(&self, id: u64) -> Result<Url, Error> {
        Ok(self.base_url.join(&id.to_string())?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Decode a 2xx body; anything else fails without reading the body.
    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), url = %resp.url(), "request failed");
            return Err(Error::RequestFailed {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
