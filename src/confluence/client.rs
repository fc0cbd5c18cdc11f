//! Confluence REST client
//!
//! Bearer-token client for the content API: page lookup by space/title,
//! page body fetch, page creation, attachment listing and download, and
//! the paginated child listing. Implements the [`AttachmentStore`] and
//! [`ChildLister`] seams consumed by the transformer and tree builder.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ConfluenceConfig;
use crate::confluence::{Attachment, AttachmentStore, ChildBatch, ChildLister, PageRef};
use crate::error::{Error, Result};

pub struct ConfluenceClient {
    http: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ContentSearchResponse {
    results: Vec<ContentRef>,
}

#[derive(Debug, Deserialize)]
struct ContentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChildListing {
    results: Vec<PageRef>,
    #[serde(rename = "_links", default)]
    links: Links,
}

#[derive(Debug, Deserialize, Default)]
struct Links {
    #[serde(default)]
    next: Option<String>,
}

impl ConfluenceClient {
    pub fn new(config: &ConfluenceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.token)
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                what: response.url().to_string(),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status,
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    /// Look up a page id by space key and title.
    pub async fn get_page_id(&self, space_key: &str, title: &str) -> Result<String> {
        let url = format!("{}/rest/api/content", self.base_url);
        let response = self
            .get(&url)
            .query(&[("spaceKey", space_key), ("title", title)])
            .send()
            .await?;
        let body: ContentSearchResponse = Self::checked(response).await?.json().await?;
        body.results
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or_else(|| Error::NotFound {
                what: format!("page '{}' in space {}", title, space_key),
            })
    }

    /// Fetch a page with its storage-format body, as returned by the API.
    pub async fn get_page_content(&self, page_id: &str) -> Result<Value> {
        let url = format!("{}/rest/api/content/{}", self.base_url, page_id);
        let response = self
            .get(&url)
            .query(&[("expand", "body.storage")])
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Create a page in a space, optionally under a parent page.
    pub async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}/rest/api/content", self.base_url);
        let mut payload = json!({
            "type": "page",
            "title": title,
            "space": {"key": space_key},
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage",
                }
            }
        });
        if let Some(parent) = parent_id {
            payload["ancestors"] = json!([{"id": parent}]);
        }

        debug!(space_key, title, "creating Confluence page");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// List a page's attachments (metadata only), as returned by the API.
    pub async fn list_attachments(&self, page_id: &str) -> Result<Value> {
        let url = format!(
            "{}/rest/api/content/{}/child/attachment",
            self.base_url, page_id
        );
        let response = self.get(&url).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }
}

#[async_trait]
impl AttachmentStore for ConfluenceClient {
    async fn fetch(&self, page_id: &str, filename: &str) -> Result<Attachment> {
        let url = format!(
            "{}/download/attachments/{}/{}",
            self.base_url, page_id, filename
        );
        debug!(page_id, filename, "downloading attachment");
        let response = Self::checked(self.get(&url).send().await?).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = response.bytes().await?.to_vec();
        Ok(Attachment {
            filename: filename.to_string(),
            mime_type,
            content,
        })
    }
}

#[async_trait]
impl ChildLister for ConfluenceClient {
    async fn list_children(
        &self,
        page_id: &str,
        start: usize,
        limit: usize,
    ) -> Result<ChildBatch> {
        let url = format!(
            "{}/rest/api/content/{}/child/page",
            self.base_url, page_id
        );
        let response = self
            .get(&url)
            .query(&[("start", start.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;
        let listing: ChildListing = Self::checked(response).await?.json().await?;
        Ok(ChildBatch {
            items: listing.results,
            has_more: listing.links.next.is_some(),
        })
    }
}
