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

//! End-to-end evaluation of serialized expression trees

use formula_engine::model::testing;
use formula_engine::{
    ErrorCode, EvaluationConfig, ExecutionContext, TypeResolver, Value, evaluate_json, from_json,
    value_to_json,
};
use pretty_assertions::assert_eq;
use serde_json::json;

mod utils;
use utils::{fixture_context, run};

const SCALED_SUM: &str = r#"{
    "expressionType": "Multiply",
    "left": {
        "expressionType": "Add",
        "left": {"expressionType": "PropertyOrField", "name": "Int32Prop"},
        "right": {
            "expressionType": "Invoke",
            "expression": {"expressionType": "PropertyOrField", "name": "TestFunctionUint8Param"},
            "arguments": {"0": {"expressionType": "Constant", "value": 5, "type": "uint8"}}
        }
    },
    "right": {"expressionType": "PropertyOrField", "name": "Scale"}
}"#;

#[test]
fn test_arithmetic_over_members_and_calls() {
    let context = ExecutionContext::builder()
        .global(testing::new_test_object())
        .resolver(testing::resolver())
        .argument("Scale", 2)
        .build();
    assert_eq!(run(SCALED_SUM, &context).unwrap(), Value::Int32(502));
}

#[test]
fn test_source_form_of_a_document() {
    let expression = formula_engine::from_json_str(SCALED_SUM).unwrap();
    assert_eq!(
        expression.to_string(),
        "((Int32Prop + TestFunctionUint8Param(5)) * Scale)"
    );
}

#[test]
fn test_conditional_with_null_propagation() {
    let document = r#"{
        "expressionType": "Condition",
        "test": {
            "expressionType": "Equal",
            "left": {
                "expressionType": "PropertyOrField",
                "expression": {"expressionType": "PropertyOrField", "name": "TestObjectProp"},
                "name": "Int32Prop",
                "useNullPropagation": true
            },
            "right": {"expressionType": "Constant", "value": null, "type": "UObject"}
        },
        "ifTrue": {"expressionType": "Constant", "value": "missing", "type": "FString"},
        "ifFalse": {"expressionType": "Constant", "value": "present", "type": "FString"}
    }"#;
    let context = fixture_context();
    assert_eq!(run(document, &context).unwrap(), Value::string("missing"));

    testing::set_field(context.global(), "TestObjectProp", testing::new_test_object());
    assert_eq!(run(document, &context).unwrap(), Value::string("present"));
}

#[test]
fn test_object_construction_document() {
    let document = r#"{
        "expressionType": "MemberInit",
        "new": {"expressionType": "New", "type": "UTestObject"},
        "bindings": [
            {
                "expressionType": "Assignment",
                "name": "Int32Prop",
                "expression": {"expressionType": "Constant", "value": 123456, "type": "int32"}
            },
            {
                "expressionType": "ListBinding",
                "name": "Int32Map",
                "initializers": [{
                    "expressionType": "ElementInitBinding",
                    "initializers": [
                        {"expressionType": "Constant", "value": "one", "type": "FString"},
                        {"expressionType": "Constant", "value": 1, "type": "int32"}
                    ]
                }]
            }
        ]
    }"#;
    let object = run(document, &fixture_context()).unwrap();
    assert_eq!(
        testing::get_field(&object, "Int32Prop"),
        Some(Value::Int32(123456))
    );
    let map = testing::get_field(&object, "Int32Map").unwrap();
    assert_eq!(value_to_json(&map), json!({"one": 1}));
}

#[test]
fn test_errors_keep_their_code_through_nesting() {
    let tree = json!({
        "expressionType": "Add",
        "left": {"expressionType": "Constant", "value": 1, "type": "int32"},
        "right": {
            "expressionType": "Negate",
            "expression": {"expressionType": "PropertyOrField", "name": "Unknown"}
        }
    });
    let error = evaluate_json(&tree, &fixture_context()).unwrap_err();
    assert_eq!(error.code(), ErrorCode::TypeUnableToResolveGlobal);
    assert!(error.to_string().contains("Unknown"));
}

#[test]
fn test_unknown_node_kind() {
    let error = from_json(&json!({"expressionType": "Loop"})).unwrap_err();
    assert_eq!(error.code(), ErrorCode::ExecUnsupportedExpression);
}

#[test]
fn test_builtin_resolver_without_global() {
    let context = ExecutionContext::builder()
        .resolver(TypeResolver::builtin())
        .argument("Name", "formula")
        .build();
    let tree = json!({
        "expressionType": "Invoke",
        "expression": {
            "expressionType": "PropertyOrField",
            "expression": {"expressionType": "PropertyOrField", "name": "Name"},
            "name": "ToUpper"
        }
    });
    assert_eq!(
        evaluate_json(&tree, &context).unwrap(),
        Value::string("FORMULA")
    );
}

#[test]
fn test_config_from_json() {
    let config: EvaluationConfig =
        serde_json::from_value(json!({"autoNullPropagation": true, "maxDepth": 8})).unwrap();
    let context = ExecutionContext::builder()
        .config(config)
        .global(testing::new_test_object())
        .resolver(testing::resolver())
        .build();
    let tree = json!({
        "expressionType": "PropertyOrField",
        "expression": {"expressionType": "PropertyOrField", "name": "TestObjectProp"},
        "name": "Int32Prop"
    });
    assert_eq!(evaluate_json(&tree, &context).unwrap(), Value::Null);
}
