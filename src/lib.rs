//! Jira/Confluence MCP server
//!
//! Exposes Jira and Confluence read/write operations to an AI agent over
//! the Model Context Protocol, and augments page and issue content with
//! AI-generated image descriptions.
//!
//! Most of the surface is pass-through REST glue. The engineered parts
//! live in [`confluence`]: the document transformer that resolves diagram
//! macros into inline literal blocks while preserving every other byte of
//! the page, and the tree builder that reassembles a full descendant page
//! hierarchy from a paginated child listing.

// Core error handling
pub mod error;

// Environment configuration
pub mod config;

// External service clients and the transformer core
pub mod ai;
pub mod confluence;
pub mod jira;

// MCP protocol server
pub mod mcp;

pub use error::{Error, Result};
