use assert_cmd::Command;
use predicates::prelude::*;

fn write_fixture(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("pkg")).unwrap();
    std::fs::write(dir.join("pkg/a.py"), "def foo():\n    return 1\n").unwrap();
    std::fs::write(
        dir.join("pkg/b.py"),
        "from pkg.a import foo\n\ndef run():\n    foo()\n",
    )
    .unwrap();
}

#[test]
fn ingest_writes_parseable_graph_json() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let out = dir.path().join("graph.json");

    Command::cargo_bin("carto")
        .unwrap()
        .args(["ingest", "--path"])
        .arg(dir.path())
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("files processed"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let nodes = json["nodes"].as_array().unwrap();
    assert!(
        nodes.iter().any(|n| n["kind"] == "Function"),
        "graph should contain function nodes"
    );
    let rels = json["relationships"].as_array().unwrap();
    assert!(
        rels.iter().any(|r| r["kind"] == "IMPORTS"),
        "graph should contain the import edge"
    );
}

#[test]
fn report_prints_resolution_rates() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    Command::cargo_bin("carto")
        .unwrap()
        .args(["report", "--path"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("imports"))
        .stdout(predicate::str::contains("calls"));
}

#[test]
fn report_json_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let output = Command::cargo_bin("carto")
        .unwrap()
        .args(["report", "--json", "--path"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["files_processed"], 2);
    assert!(report["import_resolution"]["resolved"].as_u64().unwrap() >= 1);
}

#[test]
fn missing_path_exits_with_code_three() {
    Command::cargo_bin("carto")
        .unwrap()
        .args(["ingest", "--path", "/definitely/not/here"])
        .assert()
        .failure()
        .code(3);
}
