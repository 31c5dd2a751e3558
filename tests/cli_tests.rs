mod common;

use assert_cmd::Command;
use common::{text_for, three_rows_v4, Fixture};
use ip2loc::FieldKind;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create an ip2loc command
fn ip2loc_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ip2loc"))
}

/// Write a schema 5 database (country, region, city, coordinates) to `dir`
fn write_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("test.bin");
    let bytes = Fixture::new(5)
        .ipv4(&three_rows_v4())
        .ipv6(&[(0, "SA")])
        .with_index(true)
        .build();
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_help() {
    ip2loc_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IP2Location"));
}

#[test]
fn test_version() {
    ip2loc_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ip2loc"));
}

#[test]
fn test_query_help() {
    ip2loc_cmd()
        .arg("query")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Query one or more addresses"));
}

#[test]
fn test_inspect_help() {
    ip2loc_cmd()
        .arg("inspect")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Show header metadata"));
}

#[test]
fn test_query_requires_ip() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd().arg("query").arg(&db).assert().failure();
}

#[test]
fn test_query_text_output() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("0.0.0.150")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0.0.150"))
        .stdout(predicate::str::contains("country_code : BB"))
        .stdout(predicate::str::contains(text_for("BB", FieldKind::City)));
}

#[test]
fn test_query_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    let output = ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("0.0.0.5")
        .arg("2001:db8::1")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["ip"], "0.0.0.5");
    assert_eq!(results[0]["result"]["country_code"], "AA");
    assert_eq!(
        results[0]["result"]["region"],
        text_for("AA", FieldKind::Region)
    );
    assert!(results[0]["result"]["latitude"].is_number());
    assert_eq!(results[1]["result"]["country_code"], "SA");
}

#[test]
fn test_query_field_selection() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    let output = ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("0.0.0.5")
        .arg("--fields")
        .arg("city,latitude")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = json[0]["result"].as_object().unwrap();
    let mut keys: Vec<&str> = result.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["city", "latitude"]);
}

#[test]
fn test_query_unknown_field() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("0.0.0.5")
        .arg("--fields")
        .arg("city,altitude")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field: altitude"));
}

#[test]
fn test_query_invalid_ip_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("0.0.0.5")
        .arg("not-an-ip")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("country_code : AA"))
        .stderr(predicate::str::contains("Invalid IP address"));
}

#[test]
fn test_query_invalid_ip_json_error() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    let output = ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("999.0.0.1")
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json[0]["error"]
        .as_str()
        .unwrap()
        .contains("Invalid IP address"));
}

#[test]
fn test_query_without_mmap() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd()
        .arg("query")
        .arg(&db)
        .arg("255.255.255.255")
        .arg("--no-mmap")
        .assert()
        .success()
        .stdout(predicate::str::contains("country_code : CC"));
}

#[test]
fn test_query_directory() {
    let temp_dir = TempDir::new().unwrap();
    write_db(&temp_dir);
    fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

    ip2loc_cmd()
        .arg("query")
        .arg(temp_dir.path())
        .arg("0.0.0.200")
        .assert()
        .success()
        .stdout(predicate::str::contains("country_code : CC"));
}

#[test]
fn test_query_missing_database() {
    ip2loc_cmd()
        .arg("query")
        .arg("/nonexistent/path/db.bin")
        .arg("1.2.3.4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load database"));
}

#[test]
fn test_inspect_text() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    ip2loc_cmd()
        .arg("inspect")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema:     DB5"))
        .stdout(predicate::str::contains("Build date: 2024-01-02"))
        .stdout(predicate::str::contains("IPv4: 3 ranges"))
        .stdout(predicate::str::contains("IPv6: 1 ranges"))
        .stdout(predicate::str::contains("latitude"));
}

#[test]
fn test_inspect_json() {
    let temp_dir = TempDir::new().unwrap();
    let db = write_db(&temp_dir);

    let output = ip2loc_cmd()
        .arg("inspect")
        .arg(&db)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["schema"], 5);
    assert_eq!(json["columns"], 6);
    assert_eq!(json["ipv4"]["rows"], 3);
    assert_eq!(json["ipv4"]["row_width"], 24);
    assert_eq!(json["ipv6"]["row_width"], 36);
    assert_eq!(
        json["fields"],
        serde_json::json!([
            "country_code",
            "country_name",
            "region",
            "city",
            "latitude",
            "longitude"
        ])
    );
}

#[test]
fn test_inspect_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.bin");
    fs::write(&path, b"IP2").unwrap();

    ip2loc_cmd()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Header unreadable"));
}
