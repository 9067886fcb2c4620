#![forbid(unsafe_code)]

//! draw.io (mxGraph XML) to Mermaid flowchart converter.
//!
//! Design goals:
//! - robust payload extraction under the compression/encoding conventions
//!   seen in real exported files (inline XML, URL encoding, base64 over
//!   deflate/zlib/gzip)
//! - deterministic, testable output (stable node, edge, and subgraph order)
//! - a single policy switch: strict conversions fail fast, relaxed ones
//!   degrade to partial or empty output
//!
//! ## Example
//!
//! ```
//! use mxmaid_core::{ConvertOptions, Converter, Direction};
//!
//! let xml = r#"<mxGraphModel><root>
//!   <mxCell id="0"/><mxCell id="1"/>
//!   <mxCell id="2" value="Start" style="rounded=1" vertex="1" parent="1"/>
//! </root></mxGraphModel>"#;
//!
//! let converter = Converter::strict();
//! let mermaid = converter.convert(xml, &ConvertOptions {
//!     direction: Direction::Lr,
//!     ..Default::default()
//! })?;
//! assert!(mermaid.starts_with("flowchart LR"));
//! # Ok::<(), mxmaid_core::Error>(())
//! ```

mod build;
pub mod emit;
pub mod error;
mod extract;
pub mod model;
pub mod style;

pub use emit::Direction;
pub use error::{Error, Result};
pub use model::{DiagramModel, Edge, Group, Node};
pub use style::{StyleMap, StyleValue, parse_style};

use tracing::{error, info};

/// Caller-selected knobs for one conversion call.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Which diagram page to convert when the input holds several.
    pub page_index: usize,
    pub direction: Direction,
    /// Target notation kind. Only `"flowchart"` is fully supported; anything
    /// else falls back to flowchart with a warning.
    pub kind: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            page_index: 0,
            direction: Direction::default(),
            kind: "flowchart".to_string(),
        }
    }
}

/// The conversion pipeline front: extraction, model building, emission.
///
/// Holds only the failure policy; all pipeline state is call-local, so one
/// `Converter` can be reused across inputs and calls are idempotent.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    strict: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict policy: every pipeline failure is returned as an error.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Relaxed policy: failures are logged and degrade gracefully — skip a
    /// fragment, skip a cell or edge, fall back to page 0, or return empty
    /// output — instead of aborting.
    pub fn relaxed() -> Self {
        Self { strict: false }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Extracts every diagram page from raw file content, decoded to XML
    /// text, in discovery order. The page count doubles as the page listing.
    pub fn extract_pages(&self, raw: &str) -> Result<Vec<String>> {
        extract::extract_pages(raw, self.strict)
    }

    /// Builds the structural model for one decoded page. Under the relaxed
    /// policy unparseable XML yields an empty model instead of an error.
    pub fn build_model(&self, xml: &str) -> Result<DiagramModel> {
        Ok(build::build_model(xml, self.strict)?.unwrap_or_default())
    }

    /// Runs the whole pipeline for the selected page and returns Mermaid
    /// flowchart text.
    pub fn convert(&self, raw: &str, options: &ConvertOptions) -> Result<String> {
        info!("starting conversion");
        let pages = self.extract_pages(raw)?;
        if pages.is_empty() {
            error!("no valid diagram pages found");
            if self.strict {
                return Err(Error::NoPages);
            }
            return Ok(String::new());
        }

        let mut page_index = options.page_index;
        if page_index >= pages.len() {
            error!(
                "page index {page_index} out of range (available: 0..{})",
                pages.len()
            );
            if self.strict {
                return Err(Error::PageIndex {
                    index: page_index,
                    pages: pages.len(),
                });
            }
            page_index = 0;
        }

        let Some(model) = build::build_model(&pages[page_index], self.strict)? else {
            return Ok(String::new());
        };
        let text = emit::emit_flowchart(&model, options.direction, &options.kind, self.strict)?;
        info!("conversion completed");
        Ok(text)
    }
}
