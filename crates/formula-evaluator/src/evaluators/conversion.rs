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

//! Conversion, type test and conditional evaluation

use formula_engine_ast::{ConditionExpression, ConversionKind, ConvertExpression, TypeIsExpression};
use formula_engine_core::{FormulaError, Result, TypeCode};
use formula_engine_model::{ReflectedType, TypeDescriptorRef, Value};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::engine::{FormulaEngine, invoke_operator};

impl FormulaEngine {
    pub(crate) fn evaluate_convert(
        &self,
        convert: &ConvertExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let target = self.resolve_type(&convert.target, context)?;
        let value = self.evaluate(&convert.expression, context, Some(&target), depth)?;
        self.convert_value(&value, &target, convert.kind, context)
    }

    fn convert_value(
        &self,
        value: &Value,
        target: &TypeDescriptorRef,
        kind: ConversionKind,
        context: &ExecutionContext,
    ) -> Result<Value> {
        if value.is_null() {
            return if target.can_be_null() {
                Ok(Value::Null)
            } else {
                Err(FormulaError::null_conversion_illegal(target.type_name()))
            };
        }

        if let Value::Object(_) = value {
            if is_object_type(target.reflected_type()) {
                let source = context.resolver().type_of(value);
                return if target.is_assignable_from(source.as_ref()) {
                    Ok(value.clone())
                } else if kind == ConversionKind::TypeAs {
                    trace!(from = %value.type_name(), to = %target.type_name(), "as-cast yields null");
                    Ok(Value::Null)
                } else {
                    Err(FormulaError::invalid_cast(value.type_name(), target.type_name()))
                };
            }
        }

        if let Some(converted) = value.try_coerce_to(target.as_ref(), kind.is_checked()) {
            return Ok(converted);
        }

        let source = context.resolver().type_of(value);
        target
            .try_get_conversion_operation(source.as_ref())
            .and_then(|group| invoke_operator(&group, std::slice::from_ref(value)))
            .unwrap_or_else(|| Err(FormulaError::no_conversion(value.type_name(), target.type_name())))
    }

    pub(crate) fn evaluate_type_is(
        &self,
        type_is: &TypeIsExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let target = self.resolve_type(&type_is.target, context)?;
        let value = self.evaluate(&type_is.expression, context, None, depth)?;
        if value.is_null() {
            return Ok(Value::Boolean(false));
        }

        let source = context.resolver().type_of(&value);
        let matches = target.identity() == source.identity()
            || (is_composite_type(target.reflected_type())
                && target.is_assignable_from(source.as_ref()));
        Ok(Value::Boolean(matches))
    }

    pub(crate) fn evaluate_condition(
        &self,
        condition: &ConditionExpression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
        depth: usize,
    ) -> Result<Value> {
        let test = self.evaluate(&condition.test, context, None, depth)?;
        let branch = test
            .try_copy_into(&ReflectedType::Primitive(TypeCode::Boolean))
            .and_then(|value| value.as_bool())
            .ok_or_else(|| FormulaError::invalid_conditional(test.type_name()))?;

        let chosen = if branch {
            &condition.if_true
        } else {
            &condition.if_false
        };
        self.evaluate(chosen, context, expected, depth)
    }
}

fn is_object_type(ty: &ReflectedType) -> bool {
    matches!(
        ty,
        ReflectedType::Object(_) | ReflectedType::Primitive(TypeCode::ObjectPtr)
    )
}

fn is_composite_type(ty: &ReflectedType) -> bool {
    is_object_type(ty) || matches!(ty, ReflectedType::Struct(_))
}
