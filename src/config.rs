//! Environment-based configuration
//!
//! All credentials and endpoints come from the environment (optionally via
//! a `.env` file loaded by the binary). The Azure OpenAI section is
//! optional: without it the server still runs, but the image-description
//! tools report themselves as unavailable.

use crate::error::{Error, Result};

/// Default per-request timeout for the REST clients, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub jira: JiraConfig,
    pub confluence: ConfluenceConfig,
    pub azure: Option<AzureOpenAiConfig>,
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout_seconds: u64,
}

impl Config {
    /// Read the full configuration from the environment.
    ///
    /// Jira and Confluence settings are required; the Azure OpenAI block is
    /// read only if `AZURE_OPENAI_ENDPOINT` is present, and is then required
    /// to be complete.
    pub fn from_env() -> Result<Self> {
        let jira = JiraConfig {
            base_url: required("JIRA_BASE_URL")?,
            token: required("JIRA_PERSONAL_ACCESS_TOKEN")?,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        };
        let confluence = ConfluenceConfig {
            base_url: required("CONFLUENCE_BASE_URL")?,
            token: required("CONFLUENCE_PERSONAL_ACCESS_TOKEN")?,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        };
        let azure = match std::env::var("AZURE_OPENAI_ENDPOINT") {
            Ok(endpoint) => Some(AzureOpenAiConfig {
                endpoint,
                api_key: required("AZURE_OPENAI_API_KEY")?,
                deployment: required("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")?,
                api_version: required("AZURE_OPENAI_API_VERSION")?,
                timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            }),
            Err(_) => None,
        };

        Ok(Self {
            jira,
            confluence,
            azure,
        })
    }
}

fn required(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::MissingEnv(name))
}
