// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic module dispatch: a registry from the config's `module` string to
//! a constructor for the matching `ModuleContract` (spec.md §9 "Dynamic
//! module dispatch" re-architecture guidance).

use crate::error::ModuleError;
use crate::module::{ModuleInstance, ModuleKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructs a module instance from a `tool_id` and its opaque config params.
pub type ModuleConstructor =
    Arc<dyn Fn(&str, &serde_json::Value) -> Result<ModuleInstance, ModuleError> + Send + Sync>;

/// Maps a config's `module` identifier to the constructor for that
/// `ModuleContract` variant. Construction is registration, not inheritance:
/// each entry is a tagged case over the module capability set.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    constructors: HashMap<String, ModuleConstructor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: ModuleKind,
        ctor: impl Fn(&str, &serde_json::Value) -> Result<Box<dyn crate::module::ModuleContract>, ModuleError>
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        let name = name.into();
        self.constructors.insert(
            name,
            Arc::new(move |tool_id, params| {
                Ok(ModuleInstance { kind, contract: ctor(tool_id, params)? })
            }),
        );
        self
    }

    pub fn construct(
        &self,
        module_name: &str,
        tool_id: &str,
        params: &serde_json::Value,
    ) -> Result<ModuleInstance, ModuleError> {
        let ctor = self.constructors.get(module_name).ok_or_else(|| {
            ModuleError::CommandBuildFailed(format!("no module registered under name '{module_name}'"))
        })?;
        ctor(tool_id, params)
    }

    pub fn contains(&self, module_name: &str) -> bool {
        self.constructors.contains_key(module_name)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;