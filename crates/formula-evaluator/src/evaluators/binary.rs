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

//! Binary expression evaluation

use formula_engine_ast::{BinaryExpression, Expression};
use formula_engine_core::{BinaryOperation, FormulaError, Result, TypeCode};
use formula_engine_model::{ReflectedType, Value};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::engine::{FormulaEngine, invoke_operator};
use crate::evaluators::native::NativeOperators;

impl FormulaEngine {
    pub(crate) fn evaluate_binary(
        &self,
        binary: &BinaryExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let operation = binary.operation;
        match operation {
            BinaryOperation::Coalesce => {
                let left = self.evaluate(&binary.left, context, None, depth)?;
                if left.is_null() {
                    self.evaluate(&binary.right, context, None, depth)
                } else {
                    Ok(left)
                }
            }
            BinaryOperation::AndAlso | BinaryOperation::OrElse => {
                let short_circuit = operation == BinaryOperation::OrElse;
                let left = self.evaluate_condition_operand(binary, &binary.left, context, depth)?;
                if left == short_circuit {
                    return Ok(Value::Boolean(left));
                }
                let right = self.evaluate_condition_operand(binary, &binary.right, context, depth)?;
                Ok(Value::Boolean(right))
            }
            BinaryOperation::Power => {
                let left = self.evaluate(&binary.left, context, None, depth)?;
                let right = self.evaluate(&binary.right, context, None, depth)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                match (left.visit().as_f64(), right.visit().as_f64()) {
                    (Some(base), Some(exponent)) => Ok(Value::Double(base.powf(exponent))),
                    _ => Err(FormulaError::binary_not_supported(
                        operation.symbol(),
                        left.type_name(),
                        right.type_name(),
                    )),
                }
            }
            _ => {
                let left = self.evaluate(&binary.left, context, None, depth)?;
                let right = self.evaluate(&binary.right, context, None, depth)?;
                if left.is_null() || right.is_null() {
                    return Ok(lift_null(operation, &left, &right));
                }
                self.apply_binary(operation, &left, &right, context)
            }
        }
    }

    /// Native operator first, then custom operators on the left and right types
    pub(crate) fn apply_binary(
        &self,
        operation: BinaryOperation,
        left: &Value,
        right: &Value,
        context: &ExecutionContext,
    ) -> Result<Value> {
        if let Some(result) = NativeOperators::binary(operation, left, right) {
            return Ok(result);
        }

        let operands = [left.clone(), right.clone()];
        for operand in &operands {
            let descriptor = context.resolver().type_of(operand);
            if let Some(group) = descriptor.try_get_binary_operation(operation) {
                if let Some(result) = invoke_operator(&group, &operands) {
                    trace!(
                        operator = group.name(),
                        declaring_type = descriptor.type_name(),
                        "custom binary operator"
                    );
                    return result;
                }
            }
        }

        Err(FormulaError::binary_not_supported(
            operation.symbol(),
            left.type_name(),
            right.type_name(),
        ))
    }

    /// Operand of `&&` / `||`, which must convert to a boolean
    fn evaluate_condition_operand(
        &self,
        binary: &BinaryExpression,
        operand: &Expression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<bool> {
        let value = self.evaluate(operand, context, None, depth)?;
        value
            .try_copy_into(&ReflectedType::Primitive(TypeCode::Boolean))
            .and_then(|converted| converted.as_bool())
            .ok_or_else(|| {
                FormulaError::binary_not_supported(
                    binary.operation.symbol(),
                    value.type_name(),
                    TypeCode::Boolean.cpp_name(),
                )
            })
    }
}

/// Result of an operator with at least one null operand
fn lift_null(operation: BinaryOperation, left: &Value, right: &Value) -> Value {
    let logical = |value: &Value| value.is_null() || matches!(value, Value::Boolean(_));
    match operation {
        BinaryOperation::And if logical(left) && logical(right) => {
            if left.as_bool() == Some(false) || right.as_bool() == Some(false) {
                Value::Boolean(false)
            } else {
                Value::Null
            }
        }
        BinaryOperation::Or if logical(left) && logical(right) => {
            if left.as_bool() == Some(true) || right.as_bool() == Some(true) {
                Value::Boolean(true)
            } else {
                Value::Null
            }
        }
        BinaryOperation::Equal => Value::Boolean(left.is_null() == right.is_null()),
        BinaryOperation::NotEqual => Value::Boolean(left.is_null() != right.is_null()),
        op if op.is_relational() => Value::Boolean(false),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(BinaryOperation::And, Value::Boolean(false), Value::Null, Value::Boolean(false))]
    #[case(BinaryOperation::And, Value::Null, Value::Boolean(false), Value::Boolean(false))]
    #[case(BinaryOperation::And, Value::Boolean(true), Value::Null, Value::Null)]
    #[case(BinaryOperation::Or, Value::Boolean(true), Value::Null, Value::Boolean(true))]
    #[case(BinaryOperation::Or, Value::Null, Value::Boolean(false), Value::Null)]
    #[case(BinaryOperation::And, Value::Int32(0), Value::Null, Value::Null)]
    #[case(BinaryOperation::Add, Value::Null, Value::Int32(1), Value::Null)]
    #[case(BinaryOperation::LeftShift, Value::Int32(1), Value::Null, Value::Null)]
    #[case(BinaryOperation::LessThan, Value::Null, Value::Int32(1), Value::Boolean(false))]
    #[case(BinaryOperation::Equal, Value::Null, Value::Null, Value::Boolean(true))]
    #[case(BinaryOperation::NotEqual, Value::Null, Value::string("x"), Value::Boolean(true))]
    fn null_lifting(
        #[case] operation: BinaryOperation,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(lift_null(operation, &left, &right), expected);
    }
}
