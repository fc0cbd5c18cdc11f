//! Azure OpenAI chat-completions client
//!
//! Sends the image as a base64 `data:` URL content part alongside the text
//! prompt, matching the chat-completions vision format.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::ai::{AiDescriber, Described};
use crate::config::AzureOpenAiConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    config: AzureOpenAiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::MissingEnv("AZURE_OPENAI_API_KEY"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }

    fn build_request(image: &[u8], mime_type: &str, prompt: &str) -> ChatRequest {
        let data_url = format!("data:{};base64,{}", mime_type, BASE64.encode(image));
        ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl AiDescriber for AzureOpenAiClient {
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<Described> {
        let url = self.chat_url();
        let body = Self::build_request(image, mime_type, prompt);

        debug!(mime_type, bytes = image.len(), "sending image to Azure OpenAI");
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!(%status, "Azure OpenAI error: {}", text);
            return Err(Error::Http { status, url });
        }

        let payload: Value = serde_json::from_str(&text)?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("");
        if content.trim().is_empty() {
            info!("Azure OpenAI returned no content for image");
            return Ok(Described::NoContent);
        }
        Ok(Described::Description(payload))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_config() -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            api_key: "test-key".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
            timeout_seconds: 30,
        }
    }

    #[test]
    fn test_client_empty_api_key() {
        let mut config = test_config();
        config.api_key = "".to_string();
        assert!(matches!(
            AzureOpenAiClient::new(config).err(),
            Some(Error::MissingEnv(_))
        ));
    }

    #[test]
    fn test_chat_url() {
        let client = AzureOpenAiClient::new(test_config()).unwrap();
        assert_eq!(
            client.chat_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o\
             /chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_build_request_wire_format() {
        let request = AzureOpenAiClient::build_request(b"PNG", "image/png", "Describe this");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image_url",
                            "image_url": {"url": "data:image/png;base64,UE5H"}
                        },
                        {"type": "text", "text": "Describe this"}
                    ]
                }]
            })
        );
    }
}
