// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifiers used throughout the graph: tool ids and data keys.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Sentinel `tool_id` used in `input_from` to mean "the pipeline's initial inputs".
pub const MAIN_INPUT: &str = "main_input";

macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

string_id!(ToolId, "Unique identifier for a configured tool/module instance within a pipeline.");
string_id!(DataKey, "Opaque typed-string name for a data stream shared between modules (e.g. `bam`, `vcf`).");

impl ToolId {
    /// True if this id is the `main_input` sentinel rather than a real tool.
    pub fn is_main_input(&self) -> bool {
        self.0 == MAIN_INPUT
    }
}