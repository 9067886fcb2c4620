//! End-to-end checks against the encoding conventions of exported files.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use mxmaid_core::{ConvertOptions, Converter};
use serde_json::json;
use std::io::Write as _;

const XML: &str = concat!(
    r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1"/>"#,
    r#"<mxCell id="2" value="Start" style="rounded=1" vertex="1" parent="1">"#,
    r#"<mxGeometry x="40" y="40" width="120" height="60" as="geometry"/></mxCell>"#,
    r#"<mxCell id="3" value="End" style="shape=ellipse" vertex="1" parent="1"/>"#,
    r#"<mxCell id="4" value="ok" edge="1" source="2" target="3" parent="1"/>"#,
    r#"</root></mxGraphModel>"#
);

const EXPECTED: &str = "flowchart TD\nN2(\"Start\")\nN3(( \"End\" ))\nN2 -- \"ok\" --> N3";

fn wrap(payload: &str) -> String {
    format!("<mxfile host=\"app.diagrams.net\"><diagram name=\"Page-1\">{payload}</diagram></mxfile>")
}

fn convert(raw: &str) -> String {
    Converter::strict()
        .convert(raw, &ConvertOptions::default())
        .unwrap()
}

#[test]
fn deflate_payload() {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(XML.as_bytes()).unwrap();
    let raw = wrap(&STANDARD.encode(encoder.finish().unwrap()));
    assert_eq!(convert(&raw), EXPECTED);
}

#[test]
fn zlib_payload() {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(XML.as_bytes()).unwrap();
    let raw = wrap(&STANDARD.encode(encoder.finish().unwrap()));
    assert_eq!(convert(&raw), EXPECTED);
}

#[test]
fn gzip_payload() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(XML.as_bytes()).unwrap();
    let raw = wrap(&STANDARD.encode(encoder.finish().unwrap()));
    assert_eq!(convert(&raw), EXPECTED);
}

#[test]
fn url_safe_base64_payload() {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(XML.as_bytes()).unwrap();
    let raw = wrap(&URL_SAFE.encode(encoder.finish().unwrap()));
    assert_eq!(convert(&raw), EXPECTED);
}

#[test]
fn plain_base64_payload() {
    let raw = wrap(&STANDARD.encode(XML));
    assert_eq!(convert(&raw), EXPECTED);
}

#[test]
fn model_serializes_with_stable_structure() {
    let model = Converter::strict().build_model(XML).unwrap();
    let value = serde_json::to_value(&model).unwrap();

    assert_eq!(
        value["nodes"][0],
        json!({
            "id": "2",
            "label": "Start",
            "style": "rounded=1",
            "styleMap": {"rounded": "1"},
            "geometry": {"x": "40", "y": "40", "width": "120", "height": "60", "as": "geometry"},
            "parent": "1",
        })
    );
    assert_eq!(
        value["edges"][0],
        json!({
            "id": "4",
            "source": "2",
            "target": "3",
            "label": "ok",
            "style": "",
            "styleMap": {},
        })
    );
    assert_eq!(value["groups"], json!({}));
}
