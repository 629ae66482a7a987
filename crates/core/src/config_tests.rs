// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn yaml_config(body: &str) -> Config {
    Config::parse(body, "yaml").expect("valid config")
}

#[test]
fn parses_linear_chain() {
    let cfg = yaml_config(
        r#"
tools:
  A:
    module: generic_tool
    input_from: [main_input]
    final_output: []
  B:
    module: generic_tool
    input_from: [A]
    final_output: [y]
"#,
    );
    assert_eq!(cfg.tools.len(), 2);
    assert_eq!(cfg.tools["B"].input_from, vec!["A".to_string()]);
}

#[test]
fn validate_structure_orders_a_before_b() {
    let cfg = yaml_config(
        r#"
tools:
  B:
    module: generic_tool
    input_from: [A]
  A:
    module: generic_tool
    input_from: [main_input]
"#,
    );
    let order = cfg.validate_structure().expect("acyclic");
    let pos_a = order.iter().position(|t| t.as_str() == "A").unwrap();
    let pos_b = order.iter().position(|t| t.as_str() == "B").unwrap();
    assert!(pos_a < pos_b);
}

#[test]
fn validate_structure_rejects_cycle() {
    let cfg = yaml_config(
        r#"
tools:
  A:
    module: generic_tool
    input_from: [B]
  B:
    module: generic_tool
    input_from: [A]
"#,
    );
    let err = cfg.validate_structure().unwrap_err();
    assert!(matches!(err, ConfigError::Cycle(_)));
}

#[test]
fn validate_structure_rejects_unknown_upstream() {
    let cfg = yaml_config(
        r#"
tools:
  A:
    module: generic_tool
    input_from: [ghost]
"#,
    );
    let err = cfg.validate_structure().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownUpstream(_, _)));
}

#[test]
fn diamond_topology_orders_a_before_d() {
    let cfg = yaml_config(
        r#"
tools:
  D:
    module: generic_tool
    input_from: [B, C]
  B:
    module: generic_tool
    input_from: [A]
  C:
    module: generic_tool
    input_from: [A]
  A:
    module: generic_tool
    input_from: [main_input]
"#,
    );
    let order = cfg.validate_structure().expect("acyclic");
    let pos = |id: &str| order.iter().position(|t| t.as_str() == id).unwrap();
    assert!(pos("A") < pos("B"));
    assert!(pos("A") < pos("C"));
    assert!(pos("B") < pos("D"));
    assert!(pos("C") < pos("D"));
}

#[test]
fn load_reads_yaml_from_disk_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pipeline.yaml");
    std::fs::write(
        &path,
        r#"
tools:
  A:
    module: generic_tool
    input_from: [main_input]
"#,
    )
    .expect("write config");

    let cfg = Config::load(&path).expect("load yaml config");
    assert_eq!(cfg.tools.len(), 1);
}

#[test]
fn load_reads_json_from_disk_by_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pipeline.json");
    std::fs::write(&path, r#"{"tools": {"A": {"module": "generic_tool", "input_from": ["main_input"]}}}"#)
        .expect("write config");

    let cfg = Config::load(&path).expect("load json config");
    assert_eq!(cfg.tools.len(), 1);
}

#[test]
fn load_missing_file_reports_parse_error() {
    let err = Config::load("/nonexistent/path/pipeline.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn opaque_params_are_preserved() {
    let cfg = yaml_config(
        r#"
tools:
  A:
    module: generic_tool
    input_from: [main_input]
    command_template: "bwa mem {ref_fasta} {fastq}"
"#,
    );
    assert_eq!(
        cfg.tools["A"].params.get("command_template").and_then(|v| v.as_str()),
        Some("bwa mem {ref_fasta} {fastq}")
    );
}