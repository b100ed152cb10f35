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

//! Execution context for formula evaluation
//!
//! An [`ExecutionContext`] bundles what one evaluation needs besides the tree:
//! the global object bare names resolve against, the named arguments, the type
//! resolver and the evaluation configuration.
//!
//! The context is read-only during evaluation with one exception: values
//! written to output parameters of a called function are stored back into the
//! argument they were passed through. Arguments therefore sit behind a lock, so
//! one context can still be shared by concurrent evaluations.

use std::sync::Arc;

use formula_engine_model::{TypeResolver, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::EvaluationConfig;

/// Everything an expression tree is evaluated against
///
/// ```
/// use formula_engine_evaluator::ExecutionContext;
/// use formula_engine_model::Value;
///
/// let context = ExecutionContext::builder()
///     .argument("Limit", Value::Int32(10))
///     .build();
/// assert_eq!(context.argument("Limit"), Some(Value::Int32(10)));
/// assert!(context.global().is_null());
/// ```
pub struct ExecutionContext {
    config: EvaluationConfig,
    global: Value,
    arguments: RwLock<FxHashMap<String, Value>>,
    resolver: Arc<TypeResolver>,
}

impl ExecutionContext {
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    /// Context with a global object, no arguments and the built-in resolver
    pub fn with_global(global: Value) -> Self {
        Self::builder().global(global).build()
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Root object bare names fall back to
    pub fn global(&self) -> &Value {
        &self.global
    }

    pub fn resolver(&self) -> &Arc<TypeResolver> {
        &self.resolver
    }

    pub fn auto_null_propagation(&self) -> bool {
        self.config.auto_null_propagation
    }

    /// Current value of a named argument
    pub fn argument(&self, name: &str) -> Option<Value> {
        self.arguments.read().get(name).cloned()
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.read().contains_key(name)
    }

    /// Argument names, sorted
    pub fn argument_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.arguments.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of every argument, including values written by output parameters
    pub fn arguments(&self) -> FxHashMap<String, Value> {
        self.arguments.read().clone()
    }

    /// Store the value an output parameter produced
    pub(crate) fn update_argument(&self, name: &str, value: Value) {
        self.arguments.write().insert(name.to_string(), value);
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", &self.config)
            .field("global", &self.global)
            .field("arguments", &self.argument_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ExecutionContext`]
#[derive(Default)]
pub struct ExecutionContextBuilder {
    config: EvaluationConfig,
    global: Value,
    arguments: FxHashMap<String, Value>,
    resolver: Option<Arc<TypeResolver>>,
}

impl ExecutionContextBuilder {
    pub fn config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn global(mut self, global: Value) -> Self {
        self.global = global;
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn arguments<K: Into<String>>(mut self, arguments: impl IntoIterator<Item = (K, Value)>) -> Self {
        self.arguments
            .extend(arguments.into_iter().map(|(name, value)| (name.into(), value)));
        self
    }

    /// Resolver for type names; defaults to the built-in resolver
    pub fn resolver(mut self, resolver: Arc<TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            config: self.config,
            global: self.global,
            arguments: RwLock::new(self.arguments),
            resolver: self.resolver.unwrap_or_else(TypeResolver::builtin),
        }
    }
}
