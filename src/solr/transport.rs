//! Solr HTTP transport / Solr HTTP 传输层
//!
//! [`IndexTransport`] is the seam between the connection (queues, validation) and the
//! wire. [`HttpTransport`] is the reqwest implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use url::Url;

use super::types::SolrErrorBody;
use crate::error::{Error, Result};
use crate::search::schema::Document;

/// Default connect + read timeout / 默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw Solr operations / Solr 原始操作
#[async_trait]
pub trait IndexTransport: Send + Sync {
    /// `GET admin/cores?action=STATUS`
    async fn core_status(&self) -> Result<Value>;

    /// `GET {core}/schema`
    async fn schema(&self, core: &str) -> Result<Value>;

    /// `GET {core}/select` with already marshaled parameters
    async fn select(&self, core: &str, params: &[(String, String)]) -> Result<Value>;

    /// `POST {core}/update` with a batch of documents
    async fn update(&self, core: &str, docs: &[Document], commit: bool) -> Result<Value>;

    /// `POST {core}/update?optimize=true`
    async fn optimize(&self, core: &str) -> Result<Value>;
}

/// reqwest-backed transport / 基于 reqwest 的传输
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::invalid(format!("Invalid Solr URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Decode a core-scoped response, turning Solr error bodies into errors / 解析核心响应
    async fn read_core_response(core: &str, resp: Response) -> Result<Value> {
        let status = resp.status();
        let text = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::UnknownCore(core.to_string()));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<SolrErrorBody>(&text)
                .ok()
                .and_then(|body| {
                    let code = body.error.code.unwrap_or(status.as_u16() as i64);
                    body.error.msg.map(|msg| format!("{} (code {})", msg, code))
                })
                .unwrap_or_else(|| format!("Solr responded with HTTP {}", status));
            tracing::warn!("Solr error on core {}: {}", core, message);
            return Err(Error::Search {
                core: core.to_string(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::UnexpectedResponse(e.to_string()))
    }
}

#[async_trait]
impl IndexTransport for HttpTransport {
    async fn core_status(&self) -> Result<Value> {
        let resp = self
            .client
            .get(self.url("admin/cores"))
            .query(&[("action", "STATUS"), ("wt", "json")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Connection(format!(
                "Core status request failed with HTTP {}",
                resp.status()
            )));
        }

        Ok(resp.json().await?)
    }

    async fn schema(&self, core: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(&format!("{}/schema", core)))
            .query(&[("wt", "json")])
            .send()
            .await?;
        Self::read_core_response(core, resp).await
    }

    async fn select(&self, core: &str, params: &[(String, String)]) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(&format!("{}/select", core)))
            .query(params)
            .send()
            .await?;
        Self::read_core_response(core, resp).await
    }

    async fn update(&self, core: &str, docs: &[Document], commit: bool) -> Result<Value> {
        let commit = if commit { "true" } else { "false" };
        let resp = self
            .client
            .post(self.url(&format!("{}/update", core)))
            .query(&[("commit", commit), ("wt", "json")])
            .json(docs)
            .send()
            .await?;
        Self::read_core_response(core, resp).await
    }

    async fn optimize(&self, core: &str) -> Result<Value> {
        let resp = self
            .client
            .post(self.url(&format!("{}/update", core)))
            .query(&[("optimize", "true"), ("wt", "json")])
            .send()
            .await?;
        Self::read_core_response(core, resp).await
    }
}
