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

use formula_engine_core::ErrorCode;
use formula_engine_model::{EnumValue, Value, testing};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value as Json, json};

use super::{TestUtils, constant, convert, int32, name, null_of};
use crate::ExecutionContext;

fn type_is(operand: Json, ty: &str) -> Json {
    json!({"expressionType": "TypeIs", "expression": operand, "type": ty})
}

fn objects() -> ExecutionContext {
    TestUtils::builder()
        .argument("Object", testing::new_test_object())
        .argument("Actor", testing::new_test_actor())
        .build()
}

#[rstest]
#[case("Convert", 300, "uint8", Value::UInt8(44))]
#[case("Convert", -1, "uint16", Value::UInt16(u16::MAX))]
#[case("ConvertChecked", 200, "uint8", Value::UInt8(200))]
#[case("Convert", 7, "double", Value::Double(7.0))]
#[case("Convert", 7, "FString", Value::string("7"))]
fn numeric_conversions(
    #[case] kind: &str,
    #[case] operand: i32,
    #[case] ty: &str,
    #[case] expected: Value,
) {
    let context = TestUtils::context();
    let tree = convert(kind, int32(operand), ty);
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), expected);
}

#[test]
fn checked_narrowing_out_of_range() {
    let context = TestUtils::context();
    let tree = convert("ConvertChecked", int32(300), "uint8");
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::TypeNoConversion);
    assert!(error.message().contains("'int32'"));
    assert!(error.message().contains("'uint8'"));
}

#[test]
fn as_conversion_keeps_value_errors() {
    let context = TestUtils::context();
    let unparsable = convert("TypeAs", constant(json!("abc"), "FString"), "int32");
    assert_eq!(
        TestUtils::error_code(unparsable, &context),
        ErrorCode::TypeNoConversion
    );

    let null_to_int = convert("TypeAs", null_of("UTestObject"), "int32");
    assert_eq!(
        TestUtils::error_code(null_to_int, &context),
        ErrorCode::TypeNullConversionIllegal
    );

    let no_operator = convert("TypeAs", constant(json!(true), "bool"), "FTestStruct");
    assert_eq!(
        TestUtils::error_code(no_operator, &context),
        ErrorCode::TypeNoConversion
    );
}

#[test]
fn as_conversion_of_null_object_is_null() {
    let context = TestUtils::context();
    let tree = convert("TypeAs", null_of("UTestObject"), "ATestActor");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Null);
}

#[test]
fn strings_parse_into_numbers() {
    let context = TestUtils::context();
    let tree = convert("Convert", constant(json!(" 42 "), "FString"), "int32");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(42));
}

#[test]
fn null_conversions() {
    let context = TestUtils::context();
    let to_object = convert("Convert", null_of("UTestObject"), "UTestObject");
    assert_eq!(TestUtils::evaluate(to_object, &context).unwrap(), Value::Null);

    let to_int = convert("Convert", null_of("UTestObject"), "int32");
    assert_eq!(
        TestUtils::error_code(to_int, &context),
        ErrorCode::TypeNullConversionIllegal
    );
}

#[test]
fn downcast_of_an_unrelated_object() {
    let context = objects();
    let cast = convert("Convert", name("Object"), "ATestActor");
    let error = TestUtils::evaluate(cast, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::TypeInvalidCast);
    assert!(error.message().contains("UTestObject*"));

    let soft = convert("TypeAs", name("Object"), "ATestActor");
    assert_eq!(TestUtils::evaluate(soft, &context).unwrap(), Value::Null);
}

#[test]
fn upcast_keeps_the_instance() {
    let context = objects();
    let tree = convert("Convert", name("Actor"), "UTestObject");
    let result = TestUtils::evaluate(tree, &context).unwrap();
    assert!(result.same_object(&context.argument("Actor").unwrap()));
}

#[test]
fn custom_implicit_conversion() {
    let context = TestUtils::context();
    let tree = convert("Convert", int32(7), "FTestStruct");
    let result = TestUtils::evaluate(tree, &context).unwrap();
    assert_eq!(testing::get_field(&result, "Int32Field"), Some(Value::Int32(7)));
}

#[test]
fn conversion_without_an_operator() {
    let context = TestUtils::context();
    let tree = convert("Convert", constant(json!(true), "bool"), "FTestStruct");
    assert_eq!(
        TestUtils::error_code(tree, &context),
        ErrorCode::TypeNoConversion
    );
}

#[test]
fn enum_from_literal_name() {
    let context = TestUtils::context();
    let tree = convert("Convert", constant(json!("Bson"), "FString"), "EGameDataFormat");
    assert_eq!(
        TestUtils::evaluate(tree, &context).unwrap(),
        Value::Enum(EnumValue::new(testing::game_data_format(), 2))
    );
}

#[rstest]
#[case("Object", "UTestObject", true)]
#[case("Object", "ATestActor", false)]
#[case("Actor", "UTestObject", true)]
#[case("Actor", "ATestActor", true)]
#[case("Object", "int32", false)]
fn type_tests_on_objects(#[case] argument: &str, #[case] ty: &str, #[case] expected: bool) {
    let context = objects();
    assert_eq!(
        TestUtils::evaluate(type_is(name(argument), ty), &context).unwrap(),
        Value::Boolean(expected)
    );
}

#[test]
fn type_tests_on_primitives_are_exact() {
    let context = TestUtils::context();
    assert_eq!(
        TestUtils::evaluate(type_is(int32(1), "int32"), &context).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        TestUtils::evaluate(type_is(int32(1), "int64"), &context).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        TestUtils::evaluate(type_is(null_of("UTestObject"), "UTestObject"), &context).unwrap(),
        Value::Boolean(false)
    );
}
