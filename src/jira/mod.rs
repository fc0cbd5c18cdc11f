//! Jira integration
//!
//! Plain request/response glue: issue lookup and creation, plus
//! attachment download for the image-description tools.

pub mod client;

pub use client::JiraClient;
