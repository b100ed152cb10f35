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

//! Formula Expression Evaluator
//!
//! Evaluates [`Expression`](formula_engine_ast::Expression) trees against an
//! [`ExecutionContext`]: a global object, named arguments and a type resolver.
//! Evaluation is synchronous and allocation-light; a single engine can be
//! shared freely between threads.

mod config;
mod context;
mod engine;
pub mod evaluators;

pub use config::EvaluationConfig;
pub use context::{ExecutionContext, ExecutionContextBuilder};
pub use engine::FormulaEngine;
pub use evaluators::NativeOperators;

// Tests for evaluator functionality
#[cfg(test)]
mod tests;
