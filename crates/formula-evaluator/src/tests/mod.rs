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

//! Evaluator test suites
//!
//! Trees are written in the serialized JSON notation and read with
//! [`formula_engine_ast::from_json`], so every test also covers the reader.

mod binary_tests;
mod conversion_tests;
mod invoke_tests;
mod member_tests;

use formula_engine_ast::from_json;
use formula_engine_core::{ErrorCode, Result, TypeReference};
use formula_engine_model::{Value, testing};
use serde_json::{Value as Json, json};

use crate::{ExecutionContext, FormulaEngine};

pub(crate) struct TestUtils;

impl TestUtils {
    /// Context over a fresh `UTestObject` with the fixture resolver
    pub fn context() -> ExecutionContext {
        Self::builder().build()
    }

    pub fn builder() -> crate::ExecutionContextBuilder {
        ExecutionContext::builder()
            .global(testing::new_test_object())
            .resolver(testing::resolver())
    }

    pub fn evaluate(tree: Json, context: &ExecutionContext) -> Result<Value> {
        let expression = from_json(&tree)?;
        FormulaEngine::new().execute(&expression, context, None)
    }

    /// Evaluate with the result flowing into a slot of type `expected`
    pub fn evaluate_into(tree: Json, context: &ExecutionContext, expected: &str) -> Result<Value> {
        let expression = from_json(&tree)?;
        let reference = TypeReference::parse(expected)?;
        let slot = context
            .resolver()
            .resolve(&reference)
            .unwrap_or_else(|| panic!("fixture type {expected} must resolve"));
        FormulaEngine::new().execute(&expression, context, Some(&slot))
    }

    pub fn error_code(tree: Json, context: &ExecutionContext) -> ErrorCode {
        match Self::evaluate(tree, context) {
            Ok(value) => panic!("expected an error, got {value:?}"),
            Err(error) => error.code(),
        }
    }
}

pub(crate) fn constant(value: Json, ty: &str) -> Json {
    json!({"expressionType": "Constant", "value": value, "type": ty})
}

pub(crate) fn int32(value: i32) -> Json {
    constant(json!(value), "int32")
}

pub(crate) fn null_of(ty: &str) -> Json {
    constant(Json::Null, ty)
}

pub(crate) fn name(name: &str) -> Json {
    json!({"expressionType": "PropertyOrField", "name": name})
}

pub(crate) fn property(target: Json, name: &str) -> Json {
    json!({"expressionType": "PropertyOrField", "expression": target, "name": name})
}

pub(crate) fn property_or_null(target: Json, name: &str) -> Json {
    json!({
        "expressionType": "PropertyOrField",
        "expression": target,
        "name": name,
        "useNullPropagation": true
    })
}

pub(crate) fn binary(operation: &str, left: Json, right: Json) -> Json {
    json!({"expressionType": operation, "left": left, "right": right})
}

pub(crate) fn unary(operation: &str, operand: Json) -> Json {
    json!({"expressionType": operation, "expression": operand})
}

pub(crate) fn invoke(callee: Json, arguments: Json) -> Json {
    json!({"expressionType": "Invoke", "expression": callee, "arguments": arguments})
}

pub(crate) fn convert(kind: &str, operand: Json, ty: &str) -> Json {
    json!({"expressionType": kind, "expression": operand, "type": ty})
}

pub(crate) fn new(ty: &str) -> Json {
    json!({"expressionType": "New", "type": ty})
}
