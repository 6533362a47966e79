#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CYCLE: [&str; 5] = ["Z", "HC", "IA", "R", "R"];

fn rotation_days(m: usize) -> Vec<&'static str> {
    (0..28).map(|d| CYCLE[(d + m) % 5]).collect()
}

/// Requête de février 2026 dont la grille est entièrement pré-remplie.
fn write_request(path: &Path, with_grid: bool) {
    let mut schedule = Vec::new();
    let mut quotas = serde_json::Map::new();
    for m in 0..5 {
        let days = rotation_days(m);
        quotas.insert(format!("M{m}"), json!(days.iter().filter(|d| **d == "R").count()));
        if with_grid {
            schedule.push(json!({ "name": format!("M{m}"), "days": days }));
        }
    }
    let request = json!({
        "schedule": schedule,
        "option": {
            "dayOffIndividual": quotas,
            "continuousWorkLimit": { "am": 5, "pm": 4, "total": 6 },
            "targetMonth": "2026-02"
        },
        "numSolutions": 2
    });
    fs::write(path, serde_json::to_string_pretty(&request).unwrap()).unwrap();
}

fn cli() -> Command {
    Command::cargo_bin("shiftplan-cli").unwrap()
}

#[test]
fn generate_then_check() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("request.json");
    let result = dir.path().join("result.json");
    let out_csv = dir.path().join("result.csv");
    write_request(&input, true);

    cli()
        .arg("generate")
        .arg("--input")
        .arg(&input)
        .arg("--out-json")
        .arg(&result)
        .arg("--out-csv")
        .arg(&out_csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("=== schedule 2 ==="))
        .stdout(predicate::str::contains("Generated 2 schedule(s)"))
        .stdout(predicate::str::contains("M0: Z=6, HC=6, IA=6, rest=10"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&result).unwrap()).unwrap();
    assert_eq!(saved["status"], "success");
    assert_eq!(saved["count"], 2);

    let csv = fs::read_to_string(&out_csv).unwrap();
    assert!(csv.starts_with("schedule,name,1,2,3"));
    assert_eq!(csv.lines().count(), 1 + 2 * 5);

    cli()
        .arg("check")
        .arg("--input")
        .arg(&input)
        .arg("--result")
        .arg(&result)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: 2 schedule(s), no violations"));
}

#[test]
fn check_reports_tampered_schedule() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("request.json");
    let result = dir.path().join("result.json");
    write_request(&input, true);

    cli()
        .args(["generate", "--quiet", "--count", "1"])
        .arg("--input")
        .arg(&input)
        .arg("--out-json")
        .arg(&result)
        .assert()
        .success();

    let mut saved: Value = serde_json::from_str(&fs::read_to_string(&result).unwrap()).unwrap();
    saved["schedules"][0][0]["days"][0] = json!("R");
    fs::write(&result, saved.to_string()).unwrap();

    cli()
        .arg("check")
        .arg("--input")
        .arg(&input)
        .arg("--result")
        .arg(&result)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("[am-staffing] day 1"))
        .stderr(predicate::str::contains("Found"));
}

#[test]
fn grid_csv_replaces_request_schedule() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("request.json");
    let grid = dir.path().join("grid.csv");
    write_request(&input, false);

    let mut text = String::from("name");
    for d in 1..=28 {
        text.push_str(&format!(",{d}"));
    }
    text.push('\n');
    for m in 0..5 {
        text.push_str(&format!("M{m},{}\n", rotation_days(m).join(",")));
    }
    fs::write(&grid, text).unwrap();

    cli()
        .args(["generate", "--count", "1"])
        .arg("--input")
        .arg(&input)
        .arg("--grid-csv")
        .arg(&grid)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 1 schedule(s)"));
}

#[test]
fn infeasible_request_exits_with_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("request.json");
    write_request(&input, true);
    let mut request: Value = serde_json::from_str(&fs::read_to_string(&input).unwrap()).unwrap();
    request["option"]["dayOffIndividual"]["M0"] = json!(20);
    fs::write(&input, request.to_string()).unwrap();

    cli()
        .arg("generate")
        .arg("--input")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("INFEASIBLE"));
}

#[test]
fn rejects_non_positive_budget() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("request.json");
    write_request(&input, true);

    cli()
        .args(["generate", "--budget-secs", "0"])
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--budget-secs"));
}
