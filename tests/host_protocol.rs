// End-to-end tests: drive the host binary over length-prefixed JSON on stdin/stdout.
// Uses the offline `hash` embedder so no model download is needed.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

fn temp_home(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("om-host-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn frame(v: &Value) -> Vec<u8> {
    let body = serde_json::to_vec(v).unwrap();
    let mut out = (body.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&body);
    out
}

fn request(id: &str, method: &str, params: Value) -> Value {
    json!({ "id": id, "method": method, "params": params })
}

fn parse_frames(mut bytes: &[u8]) -> Vec<Value> {
    let mut out = Vec::new();
    while bytes.len() >= 4 {
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        out.push(serde_json::from_slice(&bytes[4..4 + len]).unwrap());
        bytes = &bytes[4 + len..];
    }
    out
}

fn run_host(name: &str, requests: &[Value]) -> Vec<Value> {
    let home = temp_home(name);
    let input: Vec<u8> = requests.iter().flat_map(frame).collect();

    let assert = Command::cargo_bin("opportunity_matcher")
        .unwrap()
        .env("HOME", &home)
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::contains("fatal").not());

    let responses = parse_frames(&assert.get_output().stdout);
    let _ = std::fs::remove_dir_all(&home);
    responses
}

fn opportunity(id: &str, title: &str, description: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "organization": "Acme",
        "description": description,
        "type": "internship",
        "location": "remote",
        "deadline": "2099-01-01",
        "stipend": true,
        "year_min": 1,
        "year_max": 3,
        "tags": ["machine", "learning"],
        "inclusive_flags": ["women"],
        "link": "https://example.org/apply"
    })
}

fn scenario_profile() -> Value {
    json!({
        "name": "Asha",
        "year": 2,
        "location_pref": "remote",
        "needs_stipend": true,
        "is_female": true,
        "low_income": false,
        "interests": "machine learning research"
    })
}

#[test]
fn hello_reports_version() {
    let resp = run_host("hello", &[request("1", "hello", json!({ "clientVersion": "ui-1" }))]);
    assert_eq!(resp.len(), 1);
    assert_eq!(resp[0]["id"], "1");
    assert_eq!(resp[0]["result"]["type"], "hello-response");
    assert_eq!(resp[0]["result"]["clientVersion"], "ui-1");
    assert!(resp[0]["result"]["embedder"].is_null());
}

#[test]
fn rank_before_init_is_an_error_response() {
    let resp = run_host(
        "no-init",
        &[
            request("1", "rank", json!({ "profile": scenario_profile() })),
            request("2", "hello", json!({})),
        ],
    );
    assert_eq!(resp.len(), 2);
    assert!(resp[0]["error"].as_str().unwrap().contains("init"));
    // The loop keeps serving after a handler error.
    assert_eq!(resp[1]["result"]["type"], "hello-response");
}

#[test]
fn unknown_method_is_an_error_response() {
    let resp = run_host("unknown", &[request("9", "frobnicate", json!({}))]);
    assert!(resp[0]["error"].as_str().unwrap().contains("Unknown method"));
}

#[test]
fn load_and_rank_inline_catalog() {
    let mut malformed = opportunity("bad", "No link", "missing link");
    malformed.as_object_mut().unwrap().remove("link");

    let catalog = json!([
        opportunity("ml", "ML Research Intern", "machine learning research internship"),
        malformed,
        opportunity("bio", "Marine Biology Intern", "coral reef fieldwork"),
    ]);

    let resp = run_host(
        "inline",
        &[
            request("1", "init", json!({ "embedder": "hash" })),
            request("2", "loadCatalog", json!({ "opportunities": catalog })),
            request("3", "rank", json!({ "profile": scenario_profile() })),
            request("4", "rank", json!({ "profile": scenario_profile(), "limit": 1 })),
            request("5", "stats", json!({})),
        ],
    );

    assert_eq!(resp[0]["result"]["dims"], 384);

    let load = &resp[1]["result"];
    assert_eq!(load["count"], 2);
    assert_eq!(load["skipped"][0]["index"], 1);
    assert!(load["skipped"][0]["reason"].as_str().unwrap().contains("link"));

    let ranked = resp[2]["result"].as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["opportunity"]["id"], "ml");
    assert_eq!(ranked[1]["opportunity"]["id"], "bio");

    let top = &ranked[0]["explanation"];
    assert_eq!(top["year"], 0.15);
    assert_eq!(top["location"], 0.12);
    assert_eq!(top["stipend"], 0.1);
    assert_eq!(top["tags"], 0.12);
    assert_eq!(top["penalty"], 0.0);
    assert_eq!(ranked[1]["explanation"]["penalty"], -0.05);
    assert_eq!(ranked[0]["expired"], false);

    let limited = resp[3]["result"].as_array().unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0]["opportunity"]["id"], "ml");

    let stats = &resp[4]["result"];
    assert_eq!(stats["catalogSize"], 2);
    assert_eq!(stats["embedder"], "feature-hash-v1");
    // Only catalog vectors are cached; ranking adds nothing.
    assert_eq!(stats["cacheEntries"], 2);
    assert_eq!(stats["cacheMisses"], 2);
}

#[test]
fn extreme_year_ranges_do_not_kill_the_host() {
    let mut open_ended = opportunity("open", "Open Research", "machine learning research");
    open_ended["year_min"] = json!(3);
    open_ended["year_max"] = json!(i64::MAX);
    let mut inverted = opportunity("inv", "Inverted", "machine learning");
    inverted["year_min"] = json!(4);
    inverted["year_max"] = json!(1);

    let mut profile = scenario_profile();
    profile["year"] = json!(1);

    let resp = run_host(
        "extreme-years",
        &[
            request("1", "init", json!({ "embedder": "hash" })),
            request("2", "loadCatalog", json!({ "opportunities": [open_ended, inverted] })),
            request("3", "rank", json!({ "profile": profile })),
            request("4", "hello", json!({})),
        ],
    );
    assert_eq!(resp.len(), 4);
    assert_eq!(resp[1]["result"]["count"], 1);
    assert_eq!(resp[1]["result"]["skipped"][0]["index"], 1);

    let ranked = resp[2]["result"].as_array().unwrap();
    assert_eq!(ranked[0]["opportunity"]["id"], "open");
    assert_eq!(ranked[0]["explanation"]["year"], -0.1);
    assert_eq!(resp[3]["result"]["type"], "hello-response");
}

#[test]
fn load_catalog_from_file_and_filter_by_type() {
    let home = temp_home("file-catalog");
    let path = home.join("opportunities.json");
    let mut scholarship = opportunity("s1", "STEM Scholarship", "machine learning scholarship");
    scholarship["type"] = json!("scholarship");
    let mut expired = opportunity("old", "Old Internship", "machine learning internship");
    expired["deadline"] = json!("2000-01-01");
    let catalog = json!([
        opportunity("i1", "ML Intern", "machine learning internship"),
        scholarship,
        expired,
    ]);
    std::fs::write(&path, serde_json::to_vec(&catalog).unwrap()).unwrap();

    let mut profile = scenario_profile();
    profile["opportunity_filter"] = json!(["internship"]);

    let resp = run_host(
        "file",
        &[
            request("1", "init", json!({ "embedder": "hash" })),
            request("2", "loadCatalog", json!({ "path": path.to_string_lossy() })),
            request("3", "rank", json!({ "profile": profile.clone() })),
            request("4", "rank", json!({ "profile": profile, "excludeExpired": true })),
            request("5", "clear", json!({})),
            request("6", "stats", json!({})),
        ],
    );
    let _ = std::fs::remove_dir_all(&home);

    assert_eq!(resp[1]["result"]["count"], 3);

    let ids = |v: &Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r["opportunity"]["id"].as_str().unwrap().to_string())
            .collect()
    };
    let mut all = ids(&resp[2]["result"]);
    all.sort();
    assert_eq!(all, vec!["i1", "old"]);
    assert_eq!(ids(&resp[3]["result"]), vec!["i1"]);

    assert_eq!(resp[4]["result"]["ok"], true);
    assert_eq!(resp[5]["result"]["catalogSize"], 0);
    assert_eq!(resp[5]["result"]["cacheEntries"], 0);
}

#[test]
fn empty_catalog_ranks_to_empty_list() {
    let resp = run_host(
        "empty",
        &[
            request("1", "init", json!({ "embedder": "hash" })),
            request("2", "loadCatalog", json!({ "opportunities": [] })),
            request("3", "rank", json!({ "profile": scenario_profile() })),
        ],
    );
    assert_eq!(resp[1]["result"]["count"], 0);
    assert_eq!(resp[2]["result"], json!([]));
}

#[test]
fn unknown_embedder_is_rejected() {
    let resp = run_host(
        "unknown-embedder",
        &[
            request("1", "init", json!({ "embedder": "word2vec" })),
            request("2", "stats", json!({})),
        ],
    );
    assert!(resp[0]["error"].as_str().unwrap().contains("unknown embedder"));
    assert!(resp[1]["result"]["embedder"].is_null());
}
