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

//! Function calls on globals, targets and types

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use formula_engine_core::{ErrorCode, TypeCode};
use formula_engine_model::{DynamicClass, DynamicFunction, HostCall, HostClass, Value, testing};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{TestUtils, int32, invoke, name, property, property_or_null};
use crate::ExecutionContext;

/// `Leaf` holds an object whose `Tick` counts its calls, `Missing` is null
fn counting_context() -> (ExecutionContext, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let tick = DynamicFunction::builder("Tick")
        .returns(TypeCode::Int32.into())
        .build(move |_call: HostCall<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int32(7))
        });
    let explode = DynamicFunction::builder("Explode")
        .returns(TypeCode::Int32.into())
        .build(|_call: HostCall<'_>| Err("fuse lit".to_string()));
    let class = DynamicClass::builder("Leaf")
        .function(tick)
        .function(explode)
        .build();
    let context = TestUtils::builder()
        .argument("Leaf", class.construct().unwrap())
        .argument("Missing", Value::Null)
        .build();
    (context, calls)
}

#[test]
fn global_function_without_parameters() {
    let context = TestUtils::context();
    let tree = invoke(name("TestFunctionNoParam"), json!([]));
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(123));
}

#[test]
fn arguments_are_coerced_to_parameter_types() {
    let context = TestUtils::context();
    let positional = invoke(name("TestFunctionUint8Param"), json!([int32(5)]));
    assert_eq!(
        TestUtils::evaluate(positional, &context).unwrap(),
        Value::Int32(128)
    );

    let named = invoke(name("TestFunctionUint8Param"), json!({"InValue": int32(7)}));
    assert_eq!(TestUtils::evaluate(named, &context).unwrap(), Value::Int32(130));
}

#[test]
fn surplus_arguments_do_not_bind() {
    let context = TestUtils::context();
    let tree = invoke(name("TestFunctionNoParam"), json!([int32(1)]));
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::BindMethodSignatureMismatch);
    assert!(error.message().contains("TestFunctionNoParam"));
}

#[test]
fn static_function_through_type_name() {
    let context = TestUtils::context();
    let tree = invoke(
        property(name("UTestObject"), "StaticTestFunctionNoParam"),
        json!([]),
    );
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(123));
}

#[test]
fn static_function_by_bare_name() {
    let context = TestUtils::context();
    let tree = invoke(name("StaticTestFunctionNoParam"), json!([]));
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(123));
}

#[test]
fn instance_function_through_type_name_is_not_static() {
    let context = TestUtils::context();
    let tree = invoke(property(name("UTestObject"), "TestFunctionNoParam"), json!([]));
    assert_eq!(
        TestUtils::error_code(tree, &context),
        ErrorCode::BindStaticMemberNotFound
    );
}

#[test]
fn function_on_a_nested_object() {
    let context = TestUtils::context();
    let child = testing::new_test_object();
    testing::set_field(&child, "Int32Prop", Value::Int32(1));
    testing::set_field(context.global(), "TestObjectProp", child);

    let tree = invoke(
        property(name("TestObjectProp"), "TestFunctionUint8Param"),
        json!([int32(2)]),
    );
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(3));
}

#[test]
fn output_parameters_update_arguments() {
    let context = TestUtils::builder().argument("Result", 0).build();
    let tree = invoke(name("TestFunctionOutParam"), json!([name("Result")]));

    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Null);
    assert_eq!(context.argument("Result"), Some(Value::Int32(123)));
}

#[test]
fn output_parameters_may_be_omitted() {
    let context = TestUtils::context();
    let tree = invoke(name("TestFunctionOutParam"), json!([]));
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Null);
}

#[test]
fn struct_arguments() {
    let context = TestUtils::builder()
        .argument("Pair", testing::new_test_struct(9, "nine"))
        .build();
    let tree = invoke(name("TestFunctionStructParam"), json!([name("Pair")]));
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(9));
}

#[test]
fn call_on_null_target() {
    let context = TestUtils::context();
    let plain = invoke(property(name("TestObjectProp"), "TestFunctionNoParam"), json!([]));
    assert_eq!(TestUtils::error_code(plain, &context), ErrorCode::ExecNullReference);

    let propagated = invoke(
        property_or_null(name("TestObjectProp"), "TestFunctionNoParam"),
        json!([]),
    );
    assert_eq!(TestUtils::evaluate(propagated, &context).unwrap(), Value::Null);
}

#[test]
fn propagated_null_target_skips_the_call() {
    let (context, calls) = counting_context();
    let skipped = invoke(property_or_null(name("Missing"), "Tick"), json!([]));
    assert_eq!(TestUtils::evaluate(skipped, &context).unwrap(), Value::Null);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let called = invoke(property_or_null(name("Leaf"), "Tick"), json!([]));
    assert_eq!(TestUtils::evaluate(called, &context).unwrap(), Value::Int32(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn host_failure_message_reaches_the_caller() {
    let (context, _) = counting_context();
    let tree = invoke(property(name("Leaf"), "Explode"), json!([]));
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::BindMemberAccessFailed);
    assert!(error.message().contains("'Explode'"));
    assert!(error.message().ends_with("fuse lit"));
}

#[test]
fn unknown_function_lists_candidates() {
    let context = TestUtils::context();
    let tree = invoke(name("Missing"), json!([]));
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::TypeUnableToResolveGlobal);
    assert!(error.message().contains("TestFunctionNoParam"));
}

#[test]
fn builtin_functions_on_primitives() {
    let context = TestUtils::builder().argument("Word", "formula").build();
    let tree = invoke(property(name("Word"), "ToUpper"), json!([]));
    assert_eq!(
        TestUtils::evaluate(tree, &context).unwrap(),
        Value::string("FORMULA")
    );
}

#[test]
fn non_callable_value() {
    let context = TestUtils::context();
    let tree = invoke(int32(1), json!([]));
    assert_eq!(TestUtils::error_code(tree, &context), ErrorCode::BindMemberNotFound);
}
