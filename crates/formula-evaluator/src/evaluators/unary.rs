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

//! Unary expression evaluation

use formula_engine_ast::UnaryExpression;
use formula_engine_core::{FormulaError, Result};
use formula_engine_model::{TypeDescriptorRef, Value};

use crate::context::ExecutionContext;
use crate::engine::{FormulaEngine, invoke_operator};
use crate::evaluators::native::NativeOperators;

impl FormulaEngine {
    pub(crate) fn evaluate_unary(
        &self,
        unary: &UnaryExpression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
        depth: usize,
    ) -> Result<Value> {
        let operation = unary.operation;
        // Grouping and checked/unchecked scopes only wrap their operand
        if operation.is_passthrough() {
            return self.evaluate(&unary.expression, context, expected, depth);
        }

        let operand = self.evaluate(&unary.expression, context, None, depth)?;
        if operand.is_null() {
            return Ok(Value::Null);
        }
        if let Some(result) = NativeOperators::unary(operation, &operand) {
            return Ok(result);
        }

        let descriptor = context.resolver().type_of(&operand);
        descriptor
            .try_get_unary_operation(operation)
            .and_then(|group| invoke_operator(&group, std::slice::from_ref(&operand)))
            .unwrap_or_else(|| {
                Err(FormulaError::unary_not_supported(
                    operation.symbol(),
                    operand.type_name(),
                ))
            })
    }
}
