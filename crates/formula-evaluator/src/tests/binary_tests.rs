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

//! Binary and unary operators through the engine

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use formula_engine_core::{ErrorCode, TypeCode};
use formula_engine_model::{
    DynamicClass, DynamicFunction, HostCall, HostClass, TypeResolver, Value, testing,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::{TestUtils, binary, constant, int32, name, null_of, unary};
use crate::ExecutionContext;

#[rstest]
#[case("Add", 40, 2, 42)]
#[case("Subtract", 40, 2, 38)]
#[case("Multiply", -6, 7, -42)]
#[case("Divide", 7, 2, 3)]
#[case("Modulo", -7, 2, -1)]
#[case("And", 12, 10, 8)]
#[case("Or", 12, 10, 14)]
#[case("ExclusiveOr", 12, 10, 6)]
#[case("LeftShift", 3, 4, 48)]
#[case("RightShift", -64, 3, -8)]
fn int32_operators_match_native(
    #[case] operation: &str,
    #[case] left: i32,
    #[case] right: i32,
    #[case] expected: i32,
) {
    let context = TestUtils::context();
    let result = TestUtils::evaluate(binary(operation, int32(left), int32(right)), &context).unwrap();
    assert_eq!(result, Value::Int32(expected));
}

#[test]
fn unsigned_arithmetic_keeps_the_wider_type() {
    let context = TestUtils::context();
    let tree = binary(
        "Add",
        constant(json!(4_000_000_000u32), "uint32"),
        constant(json!(1), "uint64"),
    );
    assert_eq!(
        TestUtils::evaluate(tree, &context).unwrap(),
        Value::UInt64(4_000_000_001)
    );
}

#[test]
fn checked_overflow_is_an_operator_error() {
    let context = TestUtils::context();
    let unchecked = binary("Add", int32(i32::MAX), int32(1));
    assert_eq!(
        TestUtils::evaluate(unchecked, &context).unwrap(),
        Value::Int32(i32::MIN)
    );

    let checked = binary("AddChecked", int32(i32::MAX), int32(1));
    assert_eq!(
        TestUtils::error_code(checked, &context),
        ErrorCode::OpBinaryNotSupported
    );
}

#[test]
fn division_by_zero_is_an_operator_error() {
    let context = TestUtils::context();
    let tree = binary("Divide", int32(1), int32(0));
    assert_eq!(TestUtils::error_code(tree, &context), ErrorCode::OpBinaryNotSupported);
}

#[test]
fn mixed_signedness_comparison_is_rejected() {
    let context = TestUtils::context();
    let tree = binary("LessThan", constant(json!(1), "uint32"), int32(2));
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::OpBinaryNotSupported);
    assert_eq!(
        error.message(),
        "Binary operator '<' is not defined between types 'uint32' and 'int32'."
    );
}

#[rstest]
#[case("Add")]
#[case("Multiply")]
#[case("LeftShift")]
#[case("ExclusiveOr")]
fn null_operand_lifts_to_null(#[case] operation: &str) {
    let context = TestUtils::context();
    let left_null = binary(operation, null_of("UObject"), int32(3));
    let right_null = binary(operation, int32(3), null_of("UObject"));
    assert_eq!(TestUtils::evaluate(left_null, &context).unwrap(), Value::Null);
    assert_eq!(TestUtils::evaluate(right_null, &context).unwrap(), Value::Null);
}

#[rstest]
#[case("And", json!(false), Value::Boolean(false))]
#[case("And", json!(true), Value::Null)]
#[case("Or", json!(true), Value::Boolean(true))]
#[case("Or", json!(false), Value::Null)]
fn three_valued_logic(#[case] operation: &str, #[case] known: serde_json::Value, #[case] expected: Value) {
    let context = TestUtils::context();
    let known = constant(known, "bool");
    let forward = binary(operation, known.clone(), null_of("UObject"));
    let backward = binary(operation, null_of("UObject"), known);
    assert_eq!(TestUtils::evaluate(forward, &context).unwrap(), expected);
    assert_eq!(TestUtils::evaluate(backward, &context).unwrap(), expected);
}

#[test]
fn null_comparisons() {
    let context = TestUtils::context();
    let equal = binary("Equal", null_of("UObject"), null_of("UObject"));
    let less = binary("LessThan", null_of("UObject"), int32(1));
    assert_eq!(TestUtils::evaluate(equal, &context).unwrap(), Value::Boolean(true));
    assert_eq!(TestUtils::evaluate(less, &context).unwrap(), Value::Boolean(false));
}

#[test]
fn power_always_yields_double() {
    let context = TestUtils::context();
    let tree = binary("Power", int32(2), int32(10));
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Double(1024.0));
    let with_null = binary("Power", int32(2), null_of("UObject"));
    assert_eq!(TestUtils::evaluate(with_null, &context).unwrap(), Value::Null);
}

#[test]
fn string_concatenation() {
    let context = TestUtils::context();
    let tree = binary("Add", constant(json!("Int32Prop="), "FString"), constant(json!("x"), "FName"));
    assert_eq!(
        TestUtils::evaluate(tree, &context).unwrap(),
        Value::string("Int32Prop=x")
    );
}

/// Global object whose `Tick` function counts its calls
fn counting_context() -> (ExecutionContext, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let tick = DynamicFunction::builder("Tick")
        .returns(TypeCode::Int32.into())
        .build(move |_call: HostCall<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int32(7))
        });
    let class = DynamicClass::builder("Counter").function(tick).build();
    let global = class.construct().unwrap();
    let context = ExecutionContext::builder()
        .global(global)
        .resolver(TypeResolver::builtin())
        .build();
    (context, calls)
}

fn tick() -> serde_json::Value {
    json!({"expressionType": "Invoke", "expression": name("Tick")})
}

#[test]
fn coalesce_skips_the_right_side_for_non_null_left() {
    let (context, calls) = counting_context();
    let tree = binary("Coalesce", int32(1), tick());
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(1));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let tree = binary("Coalesce", null_of("UObject"), tick());
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn logical_operators_short_circuit() {
    let (context, calls) = counting_context();
    let right = binary("Equal", tick(), int32(7));

    let and_also = binary("AndAlso", constant(json!(false), "bool"), right.clone());
    assert_eq!(TestUtils::evaluate(and_also, &context).unwrap(), Value::Boolean(false));
    let or_else = binary("OrElse", constant(json!(true), "bool"), right.clone());
    assert_eq!(TestUtils::evaluate(or_else, &context).unwrap(), Value::Boolean(true));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let evaluated = binary("AndAlso", constant(json!(true), "bool"), right);
    assert_eq!(TestUtils::evaluate(evaluated, &context).unwrap(), Value::Boolean(true));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn logical_operators_require_booleans() {
    let context = TestUtils::context();
    let tree = binary("AndAlso", int32(1), constant(json!(true), "bool"));
    assert_eq!(TestUtils::error_code(tree, &context), ErrorCode::OpBinaryNotSupported);
}

#[test]
fn custom_struct_operators() {
    let context = TestUtils::builder()
        .argument("A", testing::new_test_struct(2, "a"))
        .argument("B", testing::new_test_struct(3, "b"))
        .build();

    let sum = TestUtils::evaluate(binary("Add", name("A"), name("B")), &context).unwrap();
    assert_eq!(
        testing::get_field(&sum, "Int32Field"),
        Some(Value::Int32(5))
    );
    let equal = TestUtils::evaluate(binary("Equal", name("A"), name("A")), &context).unwrap();
    assert_eq!(equal, Value::Boolean(true));

    let missing = binary("Multiply", name("A"), name("B"));
    let error = TestUtils::evaluate(missing, &context).unwrap_err();
    assert_eq!(
        error.message(),
        "Binary operator '*' is not defined between types 'FTestStruct' and 'FTestStruct'."
    );
}

#[rstest]
#[case("Negate", int32(5), Value::Int32(-5))]
#[case("UnaryPlus", constant(json!(5), "uint8"), Value::Int32(5))]
#[case("Not", constant(json!(false), "bool"), Value::Boolean(true))]
#[case("Complement", int32(0), Value::Int32(-1))]
#[case("Group", int32(3), Value::Int32(3))]
#[case("Negate", null_of("UObject"), Value::Null)]
fn unary_operators(#[case] operation: &str, #[case] operand: serde_json::Value, #[case] expected: Value) {
    let context = TestUtils::context();
    assert_eq!(
        TestUtils::evaluate(unary(operation, operand), &context).unwrap(),
        expected
    );
}

#[test]
fn unary_operator_on_unsupported_type() {
    let context = TestUtils::context();
    let tree = unary("Not", constant(json!("x"), "FString"));
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::OpUnaryNotSupported);
    assert_eq!(error.message(), "Unary operator '!' is not defined for type 'FString'.");
}
