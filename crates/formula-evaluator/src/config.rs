// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Evaluation configuration

use formula_engine_core::TypeCode;
use serde::Deserialize;

/// Configuration options for formula evaluation
///
/// ```
/// use formula_engine_evaluator::EvaluationConfig;
///
/// let config = EvaluationConfig::default()
///     .with_auto_null_propagation(true)
///     .with_max_depth(64);
/// assert!(config.auto_null_propagation);
/// assert_eq!(config.max_depth, 64);
/// ```
///
/// The configuration also deserializes from JSON, with every field optional:
///
/// ```
/// use formula_engine_evaluator::EvaluationConfig;
///
/// let config: EvaluationConfig =
///     serde_json::from_str(r#"{"autoNullPropagation": true}"#).unwrap();
/// assert!(config.auto_null_propagation);
/// assert_eq!(config.max_depth, 256);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationConfig {
    /// Treat every member, index and invoke node as if it used `?.`
    pub auto_null_propagation: bool,
    /// Maximum nesting depth of evaluated nodes
    pub max_depth: usize,
    /// Largest length accepted by `NewArrayBounds`
    pub max_array_length: usize,
    /// Underlying width for enums declared without one
    pub default_enum_underlying: TypeCode,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            auto_null_propagation: false,
            max_depth: 256,
            max_array_length: 1 << 20,
            default_enum_underlying: TypeCode::Int32,
        }
    }
}

impl EvaluationConfig {
    pub fn with_auto_null_propagation(mut self, enabled: bool) -> Self {
        self.auto_null_propagation = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_array_length(mut self, max_array_length: usize) -> Self {
        self.max_array_length = max_array_length;
        self
    }

    pub fn with_default_enum_underlying(mut self, code: TypeCode) -> Self {
        self.default_enum_underlying = code;
        self
    }
}
