//! AI image description
//!
//! External collaborator used by the describe-image tools: given
//! attachment bytes and a prompt, an [`AiDescriber`] returns the model's
//! structured response.
//!
//! The outcome type is deliberately explicit: an unreachable or failing
//! service is an error, while a model that answers with nothing is
//! [`Described::NoContent`]. The two used to be conflated in a silent
//! null, which hid which failure occurred.

pub mod azure;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use azure::AzureOpenAiClient;

/// Outcome of a describe call against a reachable service.
#[derive(Debug, Clone, PartialEq)]
pub enum Described {
    /// The model produced a response; the value is the raw API payload.
    Description(Value),
    /// The service answered but produced no usable content.
    NoContent,
}

/// Describes an image with a guided prompt.
#[async_trait]
pub trait AiDescriber: Send + Sync {
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<Described>;
}
