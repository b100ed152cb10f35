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

//! # Formula Evaluation Engine
//!
//! [`FormulaEngine`] walks an [`Expression`] tree and produces a [`Value`].
//! Every node kind has its own evaluator in [`crate::evaluators`]; this module
//! holds the dispatch, the depth guard and the helpers those evaluators share.
//!
//! ## Quick Start
//!
//! ```rust
//! use formula_engine_ast::from_json;
//! use formula_engine_evaluator::{ExecutionContext, FormulaEngine};
//! use formula_engine_model::{Value, testing};
//! use serde_json::json;
//!
//! let expression = from_json(&json!({
//!     "expressionType": "Multiply",
//!     "left": {"expressionType": "PropertyOrField", "name": "Int32Prop"},
//!     "right": {"expressionType": "Constant", "value": 2, "type": "int32"}
//! }))
//! .unwrap();
//!
//! let context = ExecutionContext::builder()
//!     .global(testing::new_test_object())
//!     .resolver(testing::resolver())
//!     .build();
//! let result = FormulaEngine::new().execute(&expression, &context, None).unwrap();
//! assert_eq!(result, Value::Int32(246));
//! ```

use formula_engine_ast::Expression;
use formula_engine_ast::notation::EXPRESSION_TYPE_LAMBDA;
use formula_engine_core::{FormulaError, Result, TypeReference};
use formula_engine_model::{
    InvokeArguments, MethodGroup, ReflectedType, TypeDescriptorRef, Value,
};
use tracing::{debug, trace};

use crate::context::ExecutionContext;

/// Evaluator for formula expression trees
///
/// The engine holds no state of its own; everything an evaluation depends on
/// travels in the [`ExecutionContext`]. One engine and one tree can serve any
/// number of contexts, from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEngine;

impl FormulaEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `expression` against `context`
    ///
    /// `expected` is the type of the slot receiving the result, when there is
    /// one. Struct construction needs it; every other node ignores it.
    ///
    /// # Errors
    ///
    /// Returns the first error raised anywhere in the tree, unchanged.
    pub fn execute(
        &self,
        expression: &Expression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
    ) -> Result<Value> {
        let result = self.evaluate(expression, context, expected, 0);
        match &result {
            Ok(value) => trace!(%expression, ?value, "evaluated"),
            Err(error) => debug!(%expression, %error, "evaluation failed"),
        }
        result
    }

    /// Core recursive evaluator
    pub(crate) fn evaluate(
        &self,
        expression: &Expression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
        depth: usize,
    ) -> Result<Value> {
        let max_depth = context.config().max_depth;
        if depth >= max_depth {
            return Err(FormulaError::invalid_expression(format!(
                "Maximum evaluation depth of {max_depth} exceeded."
            )));
        }
        let depth = depth + 1;

        match expression {
            Expression::Member(member) => self.evaluate_member(member, context, depth),
            Expression::Constant(constant) => self.evaluate_constant(constant, context),
            Expression::Binary(binary) => self.evaluate_binary(binary, context, depth),
            Expression::Unary(unary) => self.evaluate_unary(unary, context, expected, depth),
            Expression::Convert(convert) => self.evaluate_convert(convert, context, depth),
            Expression::TypeIs(type_is) => self.evaluate_type_is(type_is, context, depth),
            Expression::TypeOf(type_of) => {
                Ok(Value::type_value(self.resolve_type(&type_of.target, context)?))
            }
            Expression::Default(default) => {
                Ok(self.resolve_type(&default.target, context)?.default_value())
            }
            Expression::Condition(condition) => {
                self.evaluate_condition(condition, context, expected, depth)
            }
            Expression::Index(index) => self.evaluate_index(index, context, depth),
            Expression::Invoke(invoke) => self.evaluate_invoke(invoke, context, depth),
            Expression::Lambda(_) => Err(FormulaError::unsupported_expression(EXPRESSION_TYPE_LAMBDA)),
            Expression::New(new) => self.evaluate_new(new, context, expected),
            Expression::NewArrayBounds(bounds) => {
                self.evaluate_new_array_bounds(bounds, context, depth)
            }
            Expression::NewArrayInit(init) => self.evaluate_new_array_init(init, context, depth),
            Expression::MemberInit(init) => {
                self.evaluate_member_init(init, context, expected, depth)
            }
            Expression::ListInit(init) => self.evaluate_list_init(init, context, expected, depth),
        }
    }

    /// Resolve a type reference or fail with `Type_Unresolved`
    pub(crate) fn resolve_type(
        &self,
        reference: &TypeReference,
        context: &ExecutionContext,
    ) -> Result<TypeDescriptorRef> {
        context
            .resolver()
            .resolve(reference)
            .ok_or_else(|| FormulaError::unresolved_type(reference.full_name(true)))
    }

    pub(crate) fn resolve_reflected(
        &self,
        reference: &TypeReference,
        context: &ExecutionContext,
    ) -> Result<ReflectedType> {
        context
            .resolver()
            .resolve_reflected(reference)
            .ok_or_else(|| FormulaError::unresolved_type(reference.full_name(true)))
    }

    /// Outcome of a null call or access target
    pub(crate) fn null_target(&self, propagate: bool) -> Result<Value> {
        if propagate {
            Ok(Value::Null)
        } else {
            Err(FormulaError::null_reference())
        }
    }
}

/// Invoke the first overload of `group` that binds to `operands`
///
/// `None` when no overload accepts the operands, so callers can try the next
/// candidate before reporting a missing operator.
pub(crate) fn invoke_operator(group: &MethodGroup, operands: &[Value]) -> Option<Result<Value>> {
    let mut arguments = InvokeArguments::positional(operands.iter().cloned());
    group.overloads().iter().find_map(|function| {
        let bound = function.bind(None, &arguments)?;
        Some(function.invoke_bound(None, bound, &mut arguments, &[]))
    })
}
