//! CLI regression tests for the `extract-openapi` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats that the library tests can't catch.
//!
//! Run with: `cargo test -p extract-openapi-test`
//! Requires the `extract-openapi` binary to be built first (`cargo build -p extract-openapi`).

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `extract-openapi` binary.
fn extract_openapi() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("extract-openapi")
        .expect("extract-openapi binary not found, run `cargo build -p extract-openapi` first");
    cmd.env_remove("RUST_LOG")
        .env_remove("EXTRACT_OPENAPI_LOG_LEVEL")
        .env_remove("EXTRACT_OPENAPI_LOG_FORMAT");
    cmd
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/extract-openapi-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}

fn read_yaml(path: &Path) -> serde_yaml::Value {
    let text = std::fs::read_to_string(path).expect("output file");
    serde_yaml::from_str(&text).expect("valid YAML output")
}

fn schema_names(doc: &serde_yaml::Value) -> Vec<String> {
    doc["components"]["schemas"]
        .as_mapping()
        .map(|schemas| {
            schemas
                .keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Successful extraction
// ---------------------------------------------------------------------------

#[test]
fn extract_single_operation_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("--source")
        .arg(fixtures().join("petstore.yaml"))
        .args(["--paths", "/pets/{petId}=get", "--dest-file"])
        .arg(&dest)
        .assert()
        .success()
        .stderr(contains("extracted 1 path(s), 1 operation(s)"));

    let doc = read_yaml(&dest);
    let paths = doc["paths"].as_mapping().unwrap();
    assert_eq!(paths.len(), 1);
    let item = &doc["paths"]["/pets/{petId}"];
    assert!(item["get"].is_mapping());
    assert!(item["delete"].is_null());
    assert!(item["parameters"].is_sequence());

    assert_eq!(schema_names(&doc), vec!["Pet", "Category", "User"]);
    // Neither the Limit parameter nor the Error response is referenced.
    assert!(doc["components"]["parameters"].is_null());
    assert!(doc["components"]["responses"].is_null());
    assert_eq!(doc["tags"].as_sequence().unwrap().len(), 1);
    assert_eq!(doc["tags"][0]["name"], "pets");
    assert_eq!(
        doc["components"]["schemas"]["Pet"]["properties"]["owner"]["$ref"],
        "#/components/schemas/User"
    );
}

#[test]
fn extract_path_without_operations_keeps_all() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .args(["-s"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let doc = read_yaml(&dest);
    assert!(doc["paths"]["/pets"]["get"].is_mapping());
    assert!(doc["paths"]["/pets"]["post"].is_mapping());
    assert_eq!(
        schema_names(&doc),
        vec!["Pet", "NewPet", "Category", "User", "Error"]
    );
    // Still referenced by GET /pets.
    assert!(doc["components"]["parameters"]["Limit"].is_mapping());
    assert!(doc["components"]["responses"]["Error"].is_mapping());
}

#[test]
fn extract_multiple_paths() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/store/orders", "/users/{username}=GET", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let doc = read_yaml(&dest);
    assert_eq!(doc["paths"].as_mapping().unwrap().len(), 2);
    assert_eq!(schema_names(&doc), vec!["Order", "User"]);
    let tags: Vec<_> = doc["tags"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tags, vec!["store", "users"]);
}

#[test]
fn extract_cyclic_schemas_terminates() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("cyclic.yaml"))
        .args(["-p", "/nodes/{id}", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let doc = read_yaml(&dest);
    assert_eq!(schema_names(&doc), vec!["Node", "Branch"]);
    assert_eq!(doc["openapi"], "3.1.0");
}

#[test]
fn extract_json_source_to_json_output() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.json");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.json"))
        .args(["-p", "/owners", "-f", "json", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let text = std::fs::read_to_string(&dest).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).expect("valid JSON output");
    assert!(doc["paths"]["/owners"].is_object());
    assert!(doc["paths"]["/pets"].is_null());
    assert!(doc["components"]["schemas"]["Owner"].is_object());
    assert!(doc["components"]["schemas"]["Pet"].is_null());
}

#[test]
fn extract_overwrites_destination() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");
    std::fs::write(&dest, "previous: content\n").unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/users/{username}", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let doc = read_yaml(&dest);
    assert!(doc["previous"].is_null());
    assert_eq!(doc["info"]["title"], "Petstore");
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "--dry-run", "-d"])
        .arg(&dest)
        .assert()
        .success()
        .stderr(contains("dry run"));

    assert!(!dest.exists());
}

#[test]
fn json_logs_carry_event_names() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "--log-format", "json", "-d"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicates::str::is_empty())
        .stderr(
            contains("\"event\":\"source_loaded\"")
                .and(contains("\"event\":\"schemas_shaken\""))
                .and(contains("\"event\":\"completed\"")),
        );
}

#[test]
fn log_level_from_environment() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .env("EXTRACT_OPENAPI_LOG_LEVEL", "error")
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(&dest)
        .assert()
        .success()
        .stderr(contains("source_loaded").not());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn unknown_path_exits_one_without_output() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "/nope", "-d"])
        .arg(&dest)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001").and(contains("/nope")));

    assert!(!dest.exists());
}

#[test]
fn unknown_operation_exits_one() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/users/{username}=delete", "-d"])
        .arg(&dest)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));

    assert!(!dest.exists());
}

#[test]
fn invalid_operation_name_exits_one() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets=fetch", "-d"])
        .arg(tmp.path().join("out.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2012"));
}

#[test]
fn duplicate_path_exits_one() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets=get", "/pets=post", "-d"])
        .arg(tmp.path().join("out.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2011"));
}

#[test]
fn parse_error_exits_one() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(tmp.path().join("out.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1002"));
}

#[test]
fn swagger2_is_rejected() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("swagger2.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(tmp.path().join("out.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1001"));
}

#[test]
fn unresolved_ref_on_other_path_is_only_a_warning() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("unresolved-ref.yaml"))
        .args(["-p", "/pets/{petId}", "-d"])
        .arg(&dest)
        .assert()
        .success()
        .stderr(contains("E1003"));

    let doc = read_yaml(&dest);
    assert!(doc["paths"]["/pets"].is_null());
    assert_eq!(schema_names(&doc), vec!["Pet"]);
}

#[test]
fn unresolved_refs_are_written_verbatim() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("unresolved-ref.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(&dest)
        .assert()
        .success();

    let doc = read_yaml(&dest);
    let get = &doc["paths"]["/pets"]["get"];
    assert_eq!(
        get["parameters"][0]["$ref"],
        "common.yaml#/components/parameters/Limit"
    );
    assert_eq!(
        get["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/Missing"
    );
    assert!(doc["components"]["schemas"].is_null());
}

#[test]
fn missing_source_exits_three() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .args(["-s", "this-file-does-not-exist.yaml", "-p", "/pets", "-d"])
        .arg(tmp.path().join("out.yaml"))
        .assert()
        .failure()
        .code(3)
        .stderr(contains("E1000"));
}

#[test]
fn unwritable_destination_exits_three() {
    let tmp = TempDir::new().unwrap();

    extract_openapi()
        .arg("-s")
        .arg(fixtures().join("petstore.yaml"))
        .args(["-p", "/pets", "-d"])
        .arg(tmp.path().join("missing-dir").join("out.yaml"))
        .assert()
        .failure()
        .code(3);
}

#[test]
fn missing_required_args_exits_two() {
    extract_openapi()
        .args(["--source", "petstore.yaml"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn unknown_dest_format_exits_two() {
    extract_openapi()
        .args(["-s", "petstore.yaml", "-p", "/pets", "-d", "out.txt", "-f", "xml"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("xml"));
}

#[test]
fn help_lists_flags() {
    extract_openapi()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            contains("--source")
                .and(contains("--paths"))
                .and(contains("--dest-file"))
                .and(contains("--dest-format")),
        );
}

// ---------------------------------------------------------------------------
// Remote sources
// ---------------------------------------------------------------------------

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(cmd: Command) -> assert_cmd::assert::Assert {
    let mut cmd = cmd;
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .expect("blocking task")
}

#[tokio::test(flavor = "multi_thread")]
async fn extract_from_url() {
    let server = MockServer::start().await;
    let body = std::fs::read_to_string(fixtures().join("petstore.yaml")).unwrap();
    Mock::given(method("GET"))
        .and(path("/specs/petstore.yaml"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    let mut cmd = extract_openapi();
    cmd.arg("-s")
        .arg(format!("{}/specs/petstore.yaml", server.uri()))
        .args(["-p", "/users/{username}", "-d"])
        .arg(&dest);
    run_blocking(cmd).await.success();

    let doc = read_yaml(&dest);
    assert_eq!(schema_names(&doc), vec!["User"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn url_not_found_exits_three() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.yaml");

    let mut cmd = extract_openapi();
    cmd.arg("-s")
        .arg(format!("{}/missing.yaml", server.uri()))
        .args(["-p", "/pets", "-d"])
        .arg(&dest);
    run_blocking(cmd)
        .await
        .failure()
        .code(3)
        .stderr(contains("HTTP 404"));

    assert!(!dest.exists());
}
