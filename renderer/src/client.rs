//! REST client seam and SharePoint URL building.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use url::Url;

use crate::{error::FetchError, RowId};

const ODATA_ACCEPT: &str = "application/json;odata=nometadata";

/// Authenticated JSON client supplied by the host.
#[async_trait]
pub trait SpHttpClient: Send + Sync {
    /// GETs `url` and returns the decoded JSON body.
    async fn get_json(&self, url: Url) -> Result<Value, FetchError>;
}

/// List and site the rendered rows belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContext {
    /// List GUID. Pages outside a list have none.
    pub list_id: Option<String>,
    /// Absolute site URL, e.g. `https://contoso.sharepoint.com/sites/ops`.
    pub web_url: String,
}

impl ListContext {
    /// Context for `web_url`; a trailing slash is ignored.
    pub fn new(web_url: impl Into<String>, list_id: Option<String>) -> Self {
        Self {
            list_id: list_id
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            web_url: web_url.into(),
        }
    }

    /// `{web}/_api/web/lists(guid'{list}')/items({row})`
    pub fn item_url(&self, row: RowId) -> Result<Url, FetchError> {
        parse_url(self.item_path(row)?)
    }

    /// Comments collection of one item.
    pub fn comments_url(&self, row: RowId) -> Result<Url, FetchError> {
        parse_url(format!("{}/Comments", self.item_path(row)?))
    }

    fn item_path(&self, row: RowId) -> Result<String, FetchError> {
        let list_id = self
            .list_id
            .as_deref()
            .ok_or(FetchError::MissingListContext)?;
        Ok(format!(
            "{}/_api/web/lists(guid'{}')/items({})",
            self.web_url.trim_end_matches('/'),
            list_id,
            row
        ))
    }
}

fn parse_url(raw: String) -> Result<Url, FetchError> {
    Url::parse(&raw).map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))
}

/// `reqwest` implementation used outside a SharePoint page, where the
/// caller provides a bearer token instead of the page's session.
#[derive(Clone)]
pub struct ReqwestSpClient {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl ReqwestSpClient {
    /// Client with a per-request `timeout`; a blank token is ignored.
    pub fn new(timeout: Duration, bearer_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build sharepoint http client")?;
        Ok(Self {
            client,
            bearer_token: bearer_token
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        })
    }
}

#[async_trait]
impl SpHttpClient for ReqwestSpClient {
    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        let url_text = url.to_string();
        let mut request = self.client.get(url).header(ACCEPT, ODATA_ACCEPT);
        if let Some(token) = self.bearer_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                url: url_text.clone(),
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_text,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| FetchError::Decode {
                url: url_text,
                message: err.to_string(),
            })
    }
}
