// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn register_builtins_populates_all_three_names() {
    let mut registry = ModuleRegistry::new();
    register_builtins(&mut registry);
    assert!(registry.contains("shell_tool"));
    assert!(registry.contains("fixed_splitter"));
    assert!(registry.contains("concat_merger"));
}
