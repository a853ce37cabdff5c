use std::path::PathBuf;
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_causalimpact"))
}

fn repo_root() -> PathBuf {
    // crates/ci-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> String {
    repo_root().join("tests/fixtures").join(name).to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let out = run(args);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

#[test]
fn linear_fixture_has_no_lift() {
    let src = fixture_path("linear_50.csv");
    let v = run_json(&["run", "--source", &src, "--format", "json"]);
    assert_eq!(v["title"], "Causal Impact Analysis");
    assert_eq!(v["n_pre"], 40);
    assert_eq!(v["n_post"], 10);
    assert_eq!(v["table"]["Avg. Lift"], "0.00");
    let slope = v["model"]["slope"].as_f64().unwrap();
    assert!((slope - 1.5).abs() < 1e-9, "slope={slope}");
    assert!(v["chart"]["data_uri"].as_str().unwrap().starts_with("data:image/png;base64,"));
}

#[test]
fn step_fixture_html_report() {
    let src = fixture_path("step_50.csv");
    let out = run(&["run", "--source", &src, "--title", "Spring promo"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let html = String::from_utf8(out.stdout).unwrap();
    assert!(html.contains("<h1>Spring promo</h1>"));
    assert!(html.contains("<tr><td>Avg. Lift</td><td>5.00</td></tr>"));
    assert!(html.contains("<tr><td>Cumulative Lift</td><td>50.00</td></tr>"));
}

#[test]
fn half_kind_and_split_override() {
    let src = fixture_path("linear_50.csv");
    let v = run_json(&["run", "--source", &src, "--kind", "causal_impact_half", "--format", "json"]);
    assert_eq!(v["n_pre"], 25);
    assert_eq!(v["title"], "Causal Impact (50/50 split)");

    let v = run_json(&["run", "--source", &src, "--split-count", "30", "--format", "json"]);
    assert_eq!(v["n_pre"], 30);
}

#[test]
fn svg_chart_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("chart.svg");
    let src = fixture_path("step_50.csv");
    let out = run(&[
        "run",
        "--source",
        &src,
        "--format",
        "svg",
        "--theme",
        "print",
        "--output",
        out_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let svg = std::fs::read_to_string(&out_path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(">Intervention</text>"));
}

#[test]
fn bad_date_reports_schema_invalid() {
    let src = fixture_path("bad_date.csv");
    let out = run(&["run", "--source", &src]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("schema_invalid:"), "stderr={stderr}");
    assert!(stderr.contains("row 7"), "stderr={stderr}");
}

#[test]
fn constant_covariate_reports_degenerate_fit() {
    let src = fixture_path("constant_covariate.csv");
    let out = run(&["run", "--source", &src]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("degenerate_fit:"));
}

#[test]
fn invalid_ratio_reports_invalid_config() {
    let src = fixture_path("linear_50.csv");
    let out = run(&["run", "--source", &src, "--split-ratio", "1.5"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid_config:"));
}

#[test]
fn unknown_kind_fails() {
    let src = fixture_path("linear_50.csv");
    let out = run(&["run", "--source", &src, "--kind", "nope"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown report kind"));
}

#[test]
fn config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("engine.yaml");
    std::fs::write(&cfg, "source:\n  duplicates: reject\nviz:\n  output:\n    format: svg\n").unwrap();
    let src = fixture_path("linear_50.csv");
    let v = run_json(&["run", "--source", &src, "--config", cfg.to_str().unwrap(), "--format", "json"]);
    assert!(v["chart"]["data_uri"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));
}

#[test]
fn kinds_lists_registry() {
    let v = run_json(&["kinds"]);
    let tags: Vec<&str> = v.as_array().unwrap().iter().map(|k| k["tag"].as_str().unwrap()).collect();
    assert_eq!(tags, ["causal_impact", "causal_impact_half"]);
}

#[test]
fn version_prints_crate_version() {
    let out = run(&["version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("causalimpact "));
}
