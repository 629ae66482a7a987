// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::module::{InputBundle, ModuleContract, OutputBundle};
use std::collections::HashSet;

struct NoopTool;

impl ModuleContract for NoopTool {
    fn required_input_keys(&self) -> HashSet<crate::ids::DataKey> {
        HashSet::new()
    }
    fn declared_output_keys(&self) -> HashSet<crate::ids::DataKey> {
        HashSet::new()
    }
    fn build_command(&self, _input: &InputBundle) -> Result<String, ModuleError> {
        Ok("true".to_string())
    }
    fn collect_output(
        &self,
        _input: &InputBundle,
        _stdout: &str,
        _stderr: &str,
    ) -> Result<OutputBundle, ModuleError> {
        Ok(OutputBundle::Keyed(Default::default()))
    }
}

#[test]
fn construct_returns_error_for_unregistered_module() {
    let registry = ModuleRegistry::new();
    let err = registry.construct("ghost", "t1", &serde_json::Value::Null).unwrap_err();
    assert!(matches!(err, ModuleError::CommandBuildFailed(_)));
}

#[test]
fn construct_dispatches_to_registered_constructor() {
    let mut registry = ModuleRegistry::new();
    registry.register("noop", ModuleKind::Tool, |_tool_id, _params| Ok(Box::new(NoopTool) as Box<_>));
    assert!(registry.contains("noop"));
    let instance = registry.construct("noop", "t1", &serde_json::Value::Null).unwrap();
    assert!(matches!(instance.kind, ModuleKind::Tool));
    assert_eq!(instance.contract.build_command(&InputBundle::default()).unwrap(), "true");
}