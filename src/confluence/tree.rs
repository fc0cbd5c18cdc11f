//! Descendant page tree builder
//!
//! Reconstructs the full page hierarchy under a root page from the
//! paginated child listing. The defining requirement: every page of the
//! listing is drained before a child set is considered complete, so large
//! trees are never silently truncated.
//!
//! Unlike attachment resolution, failures here are fatal for the whole
//! build. A silently incomplete tree is worse than an explicit error.

use std::collections::HashSet;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confluence::{ChildLister, PageRef};
use crate::error::{Error, Result};

/// Hard recursion bound. The hierarchy is acyclic on the server side, but
/// that is an external guarantee this component cannot verify, so it
/// terminates defensively regardless.
pub const MAX_TREE_DEPTH: usize = 64;

/// Page size for the child listing.
const CHILD_PAGE_LIMIT: usize = 50;

/// One node of the descendant tree; children preserve API order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageNode {
    pub id: String,
    pub title: String,
    pub children: Vec<PageNode>,
}

/// Builds a complete descendant tree from a [`ChildLister`].
pub struct PageTreeBuilder<'a, L: ChildLister> {
    lister: &'a L,
}

impl<'a, L: ChildLister> PageTreeBuilder<'a, L> {
    pub fn new(lister: &'a L) -> Self {
        Self { lister }
    }

    /// Build the full tree rooted at `page_id`.
    ///
    /// Returns the complete tree or the first listing error; never a
    /// partial result. A repeated page id or a depth beyond
    /// [`MAX_TREE_DEPTH`] also fails the build, as either means the
    /// server-side acyclicity assumption no longer holds.
    pub async fn build(&self, page_id: &str, title: &str) -> Result<PageNode> {
        let mut visited = HashSet::new();
        visited.insert(page_id.to_string());
        let root = self
            .build_node(page_id.to_string(), title.to_string(), 0, &mut visited)
            .await?;
        debug!(
            page_id,
            descendants = visited.len() - 1,
            "page tree assembled"
        );
        Ok(root)
    }

    fn build_node<'s>(
        &'s self,
        id: String,
        title: String,
        depth: usize,
        visited: &'s mut HashSet<String>,
    ) -> BoxFuture<'s, Result<PageNode>> {
        Box::pin(async move {
            if depth >= MAX_TREE_DEPTH {
                return Err(Error::Unrecoverable(format!(
                    "page tree exceeds depth {} at page {}",
                    MAX_TREE_DEPTH, id
                )));
            }

            let child_refs = self.all_children(&id).await?;
            let mut children = Vec::with_capacity(child_refs.len());
            for child in child_refs {
                if !visited.insert(child.id.clone()) {
                    return Err(Error::Unrecoverable(format!(
                        "page {} appears more than once in the hierarchy",
                        child.id
                    )));
                }
                children.push(
                    self.build_node(child.id, child.title, depth + 1, &mut *visited)
                        .await?,
                );
            }

            Ok(PageNode {
                id,
                title,
                children,
            })
        })
    }

    /// Drain every page of the child listing for one node.
    async fn all_children(&self, id: &str) -> Result<Vec<PageRef>> {
        let mut items = Vec::new();
        let mut start = 0;
        loop {
            let batch = self
                .lister
                .list_children(id, start, CHILD_PAGE_LIMIT)
                .await?;
            let fetched = batch.items.len();
            items.extend(batch.items);
            if !batch.has_more || fetched == 0 {
                break;
            }
            start += fetched;
        }
        Ok(items)
    }
}
