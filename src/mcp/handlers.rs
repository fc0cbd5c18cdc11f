//! MCP tool handlers
//!
//! Implements each tool against the Jira/Confluence clients, the document
//! rewriter, the page tree builder, and the AI describer.

use serde_json::{json, Value};
use tracing::info;

use crate::ai::{AiDescriber, AzureOpenAiClient, Described};
use crate::config::Config;
use crate::confluence::{AttachmentStore, ConfluenceClient, DocumentRewriter, PageTreeBuilder};
use crate::error::{Error, Result};
use crate::jira::JiraClient;

use super::protocol::ToolCallResult;

/// Path of the storage-format body inside a page payload.
const STORAGE_VALUE_POINTER: &str = "/body/storage/value";

pub struct ToolHandlers {
    jira: JiraClient,
    confluence: ConfluenceClient,
    describer: Option<AzureOpenAiClient>,
}

impl ToolHandlers {
    pub fn new(config: &Config) -> Result<Self> {
        let describer = match &config.azure {
            Some(azure) => Some(AzureOpenAiClient::new(azure.clone())?),
            None => None,
        };
        Ok(Self {
            jira: JiraClient::new(&config.jira)?,
            confluence: ConfluenceClient::new(&config.confluence)?,
            describer,
        })
    }

    /// Handle a tool call by name
    pub async fn handle(&self, name: &str, args: Value) -> ToolCallResult {
        match self.dispatch(name, args).await {
            Ok(v) => ToolCallResult::json(&v),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            "get_issue_content_jira" => self.get_issue_content(args).await,
            "create_issue_jira" => self.create_issue(args).await,
            "describe_image_jira" => self.describe_image_jira(args).await,
            "get_page_id_confluence" => self.get_page_id(args).await,
            "get_page_content_confluence" => self.get_page_content(args).await,
            "create_page_confluence" => self.create_page(args).await,
            "get_attachments_confluence" => self.get_attachments(args).await,
            "describe_image_confluence" => self.describe_image_confluence(args).await,
            "get_descendant_pages_confluence" => self.get_descendant_pages(args).await,
            _ => Err(Error::InvalidArguments(format!("unknown tool: {}", name))),
        }
    }

    async fn get_issue_content(&self, args: Value) -> Result<Value> {
        let issue = required_str(&args, "issue_id_or_key")?;
        self.jira.get_issue(issue).await
    }

    async fn create_issue(&self, args: Value) -> Result<Value> {
        let project_key = required_str(&args, "project_key")?;
        let summary = required_str(&args, "summary")?;
        let description = required_str(&args, "description")?;
        let issue_type = args["issue_type"].as_str().unwrap_or("Task");
        self.jira
            .create_issue(project_key, summary, description, issue_type)
            .await
    }

    async fn describe_image_jira(&self, args: Value) -> Result<Value> {
        let url = required_str(&args, "url")?;
        let mime_type = required_str(&args, "mime_type")?;
        let prompt = required_str(&args, "prompt")?;

        let describer = self.describer()?;
        let image = self.jira.fetch_attachment(url).await?;
        let outcome = describer.describe(&image, mime_type, prompt).await?;
        Ok(describe_outcome_json(outcome))
    }

    async fn get_page_id(&self, args: Value) -> Result<Value> {
        let space_key = required_str(&args, "space_key")?;
        let title = required_str(&args, "title")?;
        let page_id = self.confluence.get_page_id(space_key, title).await?;
        Ok(json!({ "page_id": page_id }))
    }

    /// Page fetch plus the diagram transform on the storage body.
    async fn get_page_content(&self, args: Value) -> Result<Value> {
        let page_id = required_str(&args, "page_id")?;
        let mut page = self.confluence.get_page_content(page_id).await?;

        let markup = page
            .pointer(STORAGE_VALUE_POINTER)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::InvalidResponse("page payload has no body.storage.value".to_string())
            })?
            .to_string();

        let rewriter = DocumentRewriter::new(&self.confluence);
        let rewritten = rewriter.rewrite(page_id, &markup).await;
        if let Some(slot) = page.pointer_mut(STORAGE_VALUE_POINTER) {
            *slot = Value::String(rewritten);
        }
        Ok(page)
    }

    async fn create_page(&self, args: Value) -> Result<Value> {
        let space_key = required_str(&args, "space_key")?;
        let title = required_str(&args, "title")?;
        let body = required_str(&args, "body")?;
        let parent_id = args["parent_id"].as_str();
        self.confluence
            .create_page(space_key, title, body, parent_id)
            .await
    }

    async fn get_attachments(&self, args: Value) -> Result<Value> {
        let page_id = required_str(&args, "page_id")?;
        self.confluence.list_attachments(page_id).await
    }

    async fn describe_image_confluence(&self, args: Value) -> Result<Value> {
        let page_id = required_str(&args, "page_id")?;
        let filename = required_str(&args, "filename")?;
        let mime_type = required_str(&args, "mime_type")?;
        let prompt = required_str(&args, "prompt")?;

        let describer = self.describer()?;
        let attachment = self.confluence.fetch(page_id, filename).await?;
        let outcome = describer
            .describe(&attachment.content, mime_type, prompt)
            .await?;
        Ok(describe_outcome_json(outcome))
    }

    async fn get_descendant_pages(&self, args: Value) -> Result<Value> {
        let page_id = required_str(&args, "page_id")?;
        let title = args["title"].as_str().unwrap_or("");

        let builder = PageTreeBuilder::new(&self.confluence);
        let tree = builder.build(page_id, title).await?;
        info!(page_id, "descendant page tree built");
        Ok(serde_json::to_value(tree)?)
    }

    fn describer(&self) -> Result<&AzureOpenAiClient> {
        self.describer.as_ref().ok_or_else(|| {
            Error::Unrecoverable(
                "image description is unavailable: Azure OpenAI is not configured".to_string(),
            )
        })
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidArguments(format!("{} required", key)))
}

/// "Produced nothing" is an explicit marker in the output, distinct from
/// the error path used when the service itself is unreachable.
fn describe_outcome_json(outcome: Described) -> Value {
    match outcome {
        Described::Description(payload) => payload,
        Described::NoContent => json!({
            "description": Value::Null,
            "reason": "model produced no content",
        }),
    }
}
