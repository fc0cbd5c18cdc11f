//! Document rewriter
//!
//! Orchestrates scan -> fetch -> splice. Replacement is done left to right
//! over immutable slices of the source, so the spans reported by the
//! scanner are never invalidated by earlier substitutions and every
//! unmatched byte of the source reaches the output unchanged.

use std::time::Duration;

use tracing::{debug, warn};

use crate::confluence::scanner::{scan, MacroOccurrence};
use crate::confluence::{Attachment, AttachmentStore};
use crate::error::{Error, Result};

/// Retries after the first fetch attempt, for transient failures only.
const FETCH_RETRIES: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Rewrites diagram macros in stored-format markup to literal code blocks.
pub struct DocumentRewriter<'a, S: AttachmentStore> {
    store: &'a S,
}

impl<'a, S: AttachmentStore> DocumentRewriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Replace every resolvable diagram macro in `markup` with a code
    /// block holding the attachment content.
    ///
    /// Best-effort per occurrence: a macro whose attachment cannot be
    /// fetched or decoded stays in the output in its original form, and
    /// later macros are still processed. Markup without diagram macros
    /// comes back unchanged.
    pub async fn rewrite(&self, page_id: &str, markup: &str) -> String {
        let occurrences = scan(markup);
        if occurrences.is_empty() {
            return markup.to_string();
        }
        debug!(
            page_id,
            count = occurrences.len(),
            "resolving diagram macros"
        );

        let mut out = String::with_capacity(markup.len());
        let mut cursor = 0;
        for occ in &occurrences {
            out.push_str(&markup[cursor..occ.span.start]);
            match self.resolve(page_id, occ).await {
                Ok(block) => out.push_str(&block),
                Err(e) => {
                    warn!(
                        page_id,
                        filename = %occ.filename,
                        error = %e,
                        "leaving diagram macro unresolved"
                    );
                    out.push_str(&markup[occ.span.clone()]);
                }
            }
            cursor = occ.span.end;
        }
        out.push_str(&markup[cursor..]);
        out
    }

    async fn resolve(&self, page_id: &str, occ: &MacroOccurrence) -> Result<String> {
        let attachment = self.fetch_with_retry(page_id, &occ.filename).await?;
        let text = String::from_utf8(attachment.content).map_err(|_| Error::MalformedMacro {
            offset: occ.span.start,
            reason: format!("attachment {} is not valid UTF-8", occ.filename),
        })?;
        Ok(code_block(&text))
    }

    async fn fetch_with_retry(&self, page_id: &str, filename: &str) -> Result<Attachment> {
        let mut attempt = 0;
        loop {
            match self.store.fetch(page_id, filename).await {
                Ok(attachment) => return Ok(attachment),
                Err(e) if e.is_transient() && attempt < FETCH_RETRIES => {
                    attempt += 1;
                    warn!(
                        page_id,
                        filename,
                        attempt,
                        error = %e,
                        "attachment fetch failed, retrying"
                    );
                    tokio::time::sleep(RETRY_DELAY * attempt as u32).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wrap payload in a `code` structured macro so renderers show the diagram
/// definition as text instead of trying to draw a widget.
fn code_block(payload: &str) -> String {
    format!(
        "<ac:structured-macro ac:name=\"code\">\
         <ac:parameter ac:name=\"language\">json</ac:parameter>\
         <ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body>\
         </ac:structured-macro>",
        escape_cdata(payload)
    )
}

/// A literal `]]>` in the payload would terminate the CDATA section early;
/// split it across two sections.
fn escape_cdata(payload: &str) -> String {
    payload.replace("]]>", "]]]]><![CDATA[>")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use proptest::prelude::*;

    use super::*;

    /// In-memory attachment store; entries under the sentinel page id
    /// "flaky" fail once with a transient error before succeeding.
    struct FakeStore {
        attachments: HashMap<String, Vec<u8>>,
        failures: std::sync::Mutex<usize>,
        transient_failures: usize,
    }

    impl FakeStore {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                attachments: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                failures: std::sync::Mutex::new(0),
                transient_failures: 0,
            }
        }

        fn with_transient_failures(mut self, n: usize) -> Self {
            self.transient_failures = n;
            self
        }
    }

    #[async_trait]
    impl AttachmentStore for FakeStore {
        async fn fetch(&self, _page_id: &str, filename: &str) -> Result<Attachment> {
            {
                let mut failed = self.failures.lock().unwrap();
                if *failed < self.transient_failures {
                    *failed += 1;
                    return Err(Error::Http {
                        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                        url: format!("http://confluence.local/{}", filename),
                    });
                }
            }
            match self.attachments.get(filename) {
                Some(content) => Ok(Attachment {
                    filename: filename.to_string(),
                    mime_type: "application/json".to_string(),
                    content: content.clone(),
                }),
                None => Err(Error::NotFound {
                    what: format!("attachment {}", filename),
                }),
            }
        }
    }

    fn macro_for(filename: &str) -> String {
        format!(
            "<ac:structured-macro ac:name=\"gliffy\">\
             <ac:parameter ac:name=\"name\">{}</ac:parameter>\
             </ac:structured-macro>",
            filename
        )
    }

    #[tokio::test]
    async fn test_rewrite_without_macros_is_identity() {
        let store = FakeStore::new(&[]);
        let rewriter = DocumentRewriter::new(&store);
        let markup = "<h1>Title</h1><p>No diagrams at all</p>";
        assert_eq!(rewriter.rewrite("1", markup).await, markup);
    }

    #[tokio::test]
    async fn test_rewrite_worked_example() {
        let store = FakeStore::new(&[("d1.json", "{\"shapes\":[]}")]);
        let rewriter = DocumentRewriter::new(&store);
        let markup = format!("<p>A</p>{}<p>B</p>", macro_for("d1.json"));
        let out = rewriter.rewrite("1", &markup).await;
        assert_eq!(
            out,
            "<p>A</p>\
             <ac:structured-macro ac:name=\"code\">\
             <ac:parameter ac:name=\"language\">json</ac:parameter>\
             <ac:plain-text-body><![CDATA[{\"shapes\":[]}]]></ac:plain-text-body>\
             </ac:structured-macro>\
             <p>B</p>"
        );
    }

    #[tokio::test]
    async fn test_rewrite_preserves_order_and_surrounding_text() {
        let store = FakeStore::new(&[("a.json", "AAA"), ("b.json", "BBB")]);
        let rewriter = DocumentRewriter::new(&store);
        let markup = format!(
            "<p>one</p>{}<p>two</p>{}<p>three</p>",
            macro_for("a.json"),
            macro_for("b.json")
        );
        let out = rewriter.rewrite("1", &markup).await;

        let a = out.find("AAA").unwrap();
        let b = out.find("BBB").unwrap();
        assert!(a < b);
        assert_eq!(out.matches("ac:name=\"code\"").count(), 2);
        assert!(out.contains("<p>one</p>"));
        assert!(out.contains("<p>two</p>"));
        assert!(out.contains("<p>three</p>"));
        assert!(!out.contains("gliffy"));
    }

    #[tokio::test]
    async fn test_rewrite_partial_success_on_missing_attachment() {
        let store = FakeStore::new(&[("found.json", "{}")]);
        let rewriter = DocumentRewriter::new(&store);
        let markup = format!(
            "<p>x</p>{}{}<p>y</p>",
            macro_for("missing.json"),
            macro_for("found.json")
        );
        let out = rewriter.rewrite("1", &markup).await;

        // The missing one stays in original macro form.
        assert!(out.contains(&macro_for("missing.json")));
        // The resolvable one is replaced.
        assert!(!out.contains(&macro_for("found.json")));
        assert_eq!(out.matches("ac:name=\"code\"").count(), 1);
    }

    #[tokio::test]
    async fn test_rewrite_retries_transient_failures() {
        let store = FakeStore::new(&[("d.json", "{}")]).with_transient_failures(2);
        let rewriter = DocumentRewriter::new(&store);
        let markup = macro_for("d.json");
        let out = rewriter.rewrite("1", &markup).await;
        assert!(out.contains("ac:name=\"code\""));
    }

    #[tokio::test]
    async fn test_rewrite_gives_up_after_bounded_retries() {
        let store = FakeStore::new(&[("d.json", "{}")]).with_transient_failures(10);
        let rewriter = DocumentRewriter::new(&store);
        let markup = macro_for("d.json");
        let out = rewriter.rewrite("1", &markup).await;
        assert_eq!(out, markup);
        // First attempt plus FETCH_RETRIES, no more.
        assert_eq!(*store.failures.lock().unwrap(), 1 + FETCH_RETRIES);
    }

    #[tokio::test]
    async fn test_rewrite_skips_non_utf8_attachment() {
        let mut store = FakeStore::new(&[]);
        store
            .attachments
            .insert("bin.dat".to_string(), vec![0xff, 0xfe, 0x00]);
        let rewriter = DocumentRewriter::new(&store);
        let markup = macro_for("bin.dat");
        assert_eq!(rewriter.rewrite("1", &markup).await, markup);
    }

    #[tokio::test]
    async fn test_cdata_terminator_in_payload_is_escaped() {
        let store = FakeStore::new(&[("evil.json", "a]]>b")]);
        let rewriter = DocumentRewriter::new(&store);
        let out = rewriter.rewrite("1", &macro_for("evil.json")).await;
        // No unescaped terminator before the intended one.
        assert!(out.contains("a]]]]><![CDATA[>b"));
    }

    #[test]
    fn test_escape_cdata() {
        assert_eq!(escape_cdata("plain"), "plain");
        assert_eq!(escape_cdata("x]]>y"), "x]]]]><![CDATA[>y");
    }

    proptest! {
        /// Identity for arbitrary markup with no diagram macros. The
        /// store is empty, so any fetch would fail loudly; no occurrence
        /// means no fetch and byte-identical output.
        #[test]
        fn prop_rewrite_identity_without_macros(
            markup in "[a-zA-Z0-9<>/=\"' .,:;-]{0,300}"
        ) {
            prop_assume!(!markup.contains("<ac:structured-macro"));
            let store = FakeStore::new(&[]);
            let rewriter = DocumentRewriter::new(&store);
            let out = futures::executor::block_on(rewriter.rewrite("1", &markup));
            prop_assert_eq!(out, markup);
        }
    }
}
