use assert_cmd::prelude::*;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

const XML: &str = concat!(
    r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1"/>"#,
    r#"<mxCell id="2" value="Start" style="rounded=1" vertex="1" parent="1"/>"#,
    r#"<mxCell id="3" value="End" vertex="1" parent="1"/>"#,
    r#"<mxCell id="4" edge="1" source="2" target="3" parent="1"/>"#,
    r#"</root></mxGraphModel>"#
);

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn cli_converts_plain_xml() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fixture = write_fixture(&tmp, "basic.drawio", XML);

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    let assert = Command::new(exe)
        .args(["convert", fixture.to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert_eq!(
        stdout,
        "flowchart TD\nN2(\"Start\")\nN3[\"End\"]\nN2 --> N3\n"
    );
}

#[test]
fn cli_honors_direction_flag() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fixture = write_fixture(&tmp, "basic.drawio", XML);

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    let assert = Command::new(exe)
        .args([
            "convert",
            "--direction",
            "LR",
            fixture.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert!(stdout.starts_with("flowchart LR\n"));
}

#[test]
fn cli_counts_pages() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let raw = format!(
        "<mxfile><diagram>{}</diagram><diagram>{}</diagram></mxfile>",
        STANDARD.encode(XML),
        STANDARD.encode(XML)
    );
    let fixture = write_fixture(&tmp, "two_pages.drawio", &raw);

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    let assert = Command::new(exe)
        .args(["pages", fixture.to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert_eq!(stdout, "2\n");
}

#[test]
fn cli_prints_model_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fixture = write_fixture(&tmp, "basic.drawio", XML);

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    let assert = Command::new(exe)
        .args(["model", "--pretty", fixture.to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["nodes"][0]["id"], "2");
    assert_eq!(value["edges"][0]["source"], "2");
}

#[test]
fn cli_rejects_unknown_flags_with_usage() {
    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    Command::new(exe)
        .args(["convert", "--bogus"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn cli_rejects_extra_arguments_after_separator() {
    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    Command::new(exe)
        .args(["convert", "--", "one.drawio", "two.drawio"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn cli_fails_strict_on_garbage_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fixture = write_fixture(&tmp, "garbage.txt", "not a diagram at all");

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    Command::new(exe)
        .args(["convert", "--strict", fixture.to_string_lossy().as_ref()])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn cli_is_quiet_on_garbage_input_without_strict() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let fixture = write_fixture(&tmp, "garbage.txt", "not a diagram at all");

    let exe = assert_cmd::cargo_bin!("mxmaid-cli");
    let assert = Command::new(exe)
        .args(["convert", fixture.to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    assert_eq!(stdout, "\n");
}
