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

//! Embedded formula expression engine
//!
//! Evaluates serialized C#-like expression trees against a reflected host
//! object graph. This crate re-exports the workspace members:
//!
//! - [`core`]: error codes, type codes, operation kinds and type references
//! - [`model`]: runtime values, host reflection and type descriptors
//! - [`ast`]: the expression tree and its JSON reader
//! - [`evaluator`]: the execution context and the tree-walking engine
//!
//! ```
//! use formula_engine::{ExecutionContext, Value, evaluate_json};
//! use serde_json::json;
//!
//! let context = ExecutionContext::builder().argument("Limit", 40).build();
//! let tree = json!({
//!     "expressionType": "Add",
//!     "left": {"expressionType": "PropertyOrField", "name": "Limit"},
//!     "right": {"expressionType": "Constant", "value": 2, "type": "int32"}
//! });
//! assert_eq!(evaluate_json(&tree, &context).unwrap(), Value::Int32(42));
//! ```

pub mod value_json;

pub use formula_engine_ast as ast;
pub use formula_engine_core as core;
pub use formula_engine_evaluator as evaluator;
pub use formula_engine_model as model;

// Re-export main types
pub use formula_engine_ast::{Expression, ExpressionRef, from_json, from_json_str};
pub use formula_engine_core::{ErrorCode, FormulaError, Result, TypeCode, TypeReference};
pub use formula_engine_evaluator::{
    EvaluationConfig, ExecutionContext, ExecutionContextBuilder, FormulaEngine,
};
pub use formula_engine_model::{TypeDescriptor, TypeDescriptorRef, TypeResolver, Value};
pub use value_json::{value_from_json, value_to_json};

/// Read an expression tree from JSON and evaluate it
pub fn evaluate_json(tree: &serde_json::Value, context: &ExecutionContext) -> Result<Value> {
    let expression = from_json(tree)?;
    log::trace!("evaluating {expression}");
    FormulaEngine::new().execute(&expression, context, None)
}
