//! Confluence integration
//!
//! The interesting half of this crate. `scanner` and `rewrite` implement
//! the document transformer: diagram macros embedded in stored-format
//! markup are resolved to their attachment content and spliced back in as
//! literal code blocks, with every other byte of the page preserved.
//! `tree` rebuilds the full descendant page hierarchy from the paginated
//! child listing. `client` is the concrete REST client behind both.
//!
//! The transformer and tree builder talk to Confluence only through the
//! [`AttachmentStore`] and [`ChildLister`] seams so they can be tested
//! against in-memory fakes.

pub mod client;
pub mod rewrite;
pub mod scanner;
pub mod tree;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::ConfluenceClient;
pub use rewrite::DocumentRewriter;
pub use scanner::{scan, MacroOccurrence};
pub use tree::{PageNode, PageTreeBuilder};

/// A page attachment, fetched read-only from Confluence.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Resolves attachments by page id and filename.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Fetch attachment bytes and metadata. A missing attachment surfaces
    /// as [`crate::Error::NotFound`].
    async fn fetch(&self, page_id: &str, filename: &str) -> Result<Attachment>;
}

/// One `{id, title}` entry from a child-page listing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub title: String,
}

/// One page of a paginated child listing.
#[derive(Debug, Clone)]
pub struct ChildBatch {
    pub items: Vec<PageRef>,
    pub has_more: bool,
}

/// Paginated access to a page's immediate children.
#[async_trait]
pub trait ChildLister: Send + Sync {
    /// List children of `page_id` starting at offset `start`, returning at
    /// most `limit` entries and whether more remain.
    async fn list_children(&self, page_id: &str, start: usize, limit: usize)
        -> Result<ChildBatch>;
}
