//! Diagram payload extraction.
//!
//! Real-world draw.io files store each page's `<diagram>` body in one of
//! several conventions: inline XML, URL-encoded XML, base64-encoded XML, or
//! base64 over a deflate/zlib/gzip stream (the browser editor uses pako).
//! The strategies below are tried in a fixed priority order; a candidate is
//! accepted as soon as the decoded text contains the graph-model marker.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use flate2::read::{DeflateDecoder, GzDecoder, MultiGzDecoder, ZlibDecoder};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

/// The substring identifying decoded graph-model XML.
pub(crate) const GRAPH_MODEL_MARKER: &str = "<mxGraphModel";

fn diagram_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<diagram[^>]*>(.*?)</diagram>").unwrap())
}

/// Extracts the decoded XML text of every diagram page found in `raw`, in
/// discovery order.
///
/// Under the strict policy a fragment that defeats every decoding strategy
/// aborts the whole call; relaxed skips it and keeps going.
pub(crate) fn extract_pages(raw: &str, strict: bool) -> Result<Vec<String>> {
    if raw.contains(GRAPH_MODEL_MARKER) {
        debug!("input already contains a graph model; treating it as a single page");
        return Ok(vec![raw.to_string()]);
    }

    let mut fragments: Vec<String> = diagram_tag_re()
        .captures_iter(raw)
        .map(|caps| caps[1].to_string())
        .collect();
    if fragments.is_empty() {
        fragments = mxfile_fragments(raw);
    }

    if fragments.is_empty() {
        error!("input contains no graph model, <diagram> tags, or mxfile root");
        if strict {
            return Err(Error::Extraction {
                reason: "no diagram payload found in input".to_string(),
            });
        }
        return Ok(Vec::new());
    }

    debug!("found {} diagram fragment(s)", fragments.len());
    let mut pages = Vec::new();
    for (index, fragment) in fragments.iter().enumerate() {
        if let Some(page) = decode_fragment(fragment, index, strict)? {
            pages.push(page);
        }
    }
    Ok(pages)
}

/// Some files use `<mxfile>` as the document root with the payload as the
/// text of each `<diagram>` child.
fn mxfile_fragments(raw: &str) -> Vec<String> {
    let doc = match roxmltree::Document::parse(raw) {
        Ok(doc) => doc,
        Err(err) => {
            debug!("mxfile probe failed to parse input as XML: {err}");
            return Vec::new();
        }
    };
    let root = doc.root_element();
    if root.tag_name().name() != "mxfile" {
        return Vec::new();
    }
    debug!("input is an mxfile; extracting diagram payloads");
    root.children()
        .filter(|child| child.has_tag_name("diagram"))
        .map(|diagram| diagram.text().unwrap_or("").to_string())
        .collect()
}

/// Decodes one `<diagram>` fragment. `Ok(None)` means the fragment was
/// skipped (empty, or undecodable under the relaxed policy).
fn decode_fragment(fragment: &str, index: usize, strict: bool) -> Result<Option<String>> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        warn!("diagram fragment {index} is empty; skipping");
        return Ok(None);
    }

    if fragment.starts_with('<') && fragment.contains(GRAPH_MODEL_MARKER) {
        debug!("fragment {index} is inline XML");
        return Ok(Some(fragment.to_string()));
    }

    if let Ok(decoded) = percent_decode_str(fragment).decode_utf8() {
        if decoded.contains(GRAPH_MODEL_MARKER) {
            debug!("fragment {index} was URL encoded");
            return Ok(Some(decoded.into_owned()));
        }
    }

    let decoded = match decode_base64(fragment) {
        Ok(bytes) => bytes,
        Err(reason) => {
            error!("base64 decoding failed for fragment {index}: {reason}");
            if strict {
                return Err(Error::Extraction {
                    reason: format!("fragment {index}: {reason}"),
                });
            }
            return Ok(None);
        }
    };

    // Base64-wrapped but otherwise uncompressed XML.
    if let Ok(text) = std::str::from_utf8(&decoded) {
        if text.starts_with('<') && text.contains(GRAPH_MODEL_MARKER) {
            debug!("fragment {index} was base64-encoded XML");
            return Ok(Some(text.to_string()));
        }
    }

    let attempts: [(&str, fn(&[u8]) -> std::io::Result<Vec<u8>>); 4] = [
        ("raw deflate", |bytes| inflate(DeflateDecoder::new(bytes))),
        ("zlib", |bytes| inflate(ZlibDecoder::new(bytes))),
        ("gzip", |bytes| inflate(GzDecoder::new(bytes))),
        // pako emits multi-member gzip streams that the plain gzip reader
        // can truncate.
        ("gzip member stream", |bytes| {
            inflate(MultiGzDecoder::new(bytes))
        }),
    ];
    for (desc, attempt) in attempts {
        match attempt(&decoded) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                if text.contains(GRAPH_MODEL_MARKER) {
                    info!("decompressed fragment {index} using {desc}");
                    return Ok(Some(text.into_owned()));
                }
                warn!("decompression with {desc} succeeded for fragment {index}, but no graph model found");
            }
            Err(err) => {
                debug!("decompression attempt with {desc} failed for fragment {index}: {err}");
            }
        }
    }

    // Last resort: salvage printable bytes and hope the builder copes.
    if !strict {
        let cleaned: String = decoded
            .iter()
            .filter(|&&b| (0x20..0x7f).contains(&b))
            .map(|&b| b as char)
            .collect();
        if cleaned.contains('<') && cleaned.contains('>') {
            warn!(
                "fragment {index} could not be decompressed but contains XML-like content; \
                 attempting to process it"
            );
            return Ok(Some(cleaned));
        }
    }

    error!(
        "failed to decode fragment {index} with all known strategies; \
         likely corrupt or an unsupported compression format"
    );
    if strict {
        return Err(Error::Extraction {
            reason: format!("fragment {index}: all decoding strategies exhausted"),
        });
    }
    Ok(None)
}

/// Standard-alphabet base64 first, URL-safe as a fallback. Whitespace is
/// stripped and padding restored beforehand; exported files often wrap the
/// payload and omit `=`.
fn decode_base64(fragment: &str) -> std::result::Result<Vec<u8>, String> {
    let mut compact: String = fragment.chars().filter(|c| !c.is_whitespace()).collect();
    let rem = compact.len() % 4;
    if rem != 0 {
        compact.extend(std::iter::repeat_n('=', 4 - rem));
    }
    match STANDARD.decode(&compact) {
        Ok(bytes) => Ok(bytes),
        Err(first) => match URL_SAFE.decode(&compact) {
            Ok(bytes) => {
                debug!("fragment decoded with the URL-safe base64 alphabet");
                Ok(bytes)
            }
            Err(second) => Err(format!(
                "base64 decode failed (standard: {first}; url-safe: {second})"
            )),
        },
    }
}

fn inflate<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
