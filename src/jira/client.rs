//! Jira REST client

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::JiraConfig;
use crate::error::{Error, Result};

/// Issue fields returned by [`JiraClient::get_issue`].
const ISSUE_FIELDS: &[&str] = &[
    "assignee",
    "attachment",
    "comment",
    "components",
    "created",
    "description",
    "issuetype",
    "labels",
    "reporter",
    "status",
    "summary",
    "updated",
];

pub struct JiraClient {
    http: Client,
    base_url: String,
    token: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
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

    /// Fetch an issue by id or key ("PROJ-123") with the standard field
    /// selection, as returned by the API.
    pub async fn get_issue(&self, issue_id_or_key: &str) -> Result<Value> {
        let url = format!("{}/rest/api/2/issue/{}", self.base_url, issue_id_or_key);
        debug!(issue = issue_id_or_key, "fetching Jira issue");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", ISSUE_FIELDS.join(","))])
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Create an issue; returns the API response (`id`, `key`, `self`).
    pub async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<Value> {
        let url = format!("{}/rest/api/2/issue", self.base_url);
        let payload = json!({
            "fields": {
                "project": {"key": project_key},
                "summary": summary,
                "description": description,
                "issuetype": {"name": issue_type},
            }
        });
        debug!(project_key, summary, "creating Jira issue");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Download attachment bytes from a direct attachment URL (as found in
    /// an issue's `attachment` field).
    pub async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "downloading Jira attachment");
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        Ok(Self::checked(response).await?.bytes().await?.to_vec())
    }
}
