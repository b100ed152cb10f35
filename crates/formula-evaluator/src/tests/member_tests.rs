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

//! Member access, globals and null propagation

use formula_engine_core::ErrorCode;
use formula_engine_model::{Value, testing};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{TestUtils, name, property, property_or_null};
use crate::EvaluationConfig;

#[test]
fn bare_names_resolve_against_the_global() {
    let context = TestUtils::context();
    assert_eq!(
        TestUtils::evaluate(name("Int32Prop"), &context).unwrap(),
        Value::Int32(123)
    );
}

#[test]
fn arguments_shadow_global_members() {
    let context = TestUtils::builder().argument("Int32Prop", 5).build();
    assert_eq!(
        TestUtils::evaluate(name("Int32Prop"), &context).unwrap(),
        Value::Int32(5)
    );
}

#[test]
fn escaped_names_resolve_arguments() {
    let context = TestUtils::builder().argument("true", "escaped").build();
    let tree = json!({"expressionType": "PropertyOrField", "name": "@true"});
    assert_eq!(
        TestUtils::evaluate(tree, &context).unwrap(),
        Value::string("escaped")
    );
    assert_eq!(
        TestUtils::evaluate(name("true"), &context).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(TestUtils::evaluate(name("null"), &context).unwrap(), Value::Null);
}

#[test]
fn unknown_global_lists_candidates() {
    let context = TestUtils::builder().argument("Limit", 1).build();
    let error = TestUtils::evaluate(name("Missing"), &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::TypeUnableToResolveGlobal);
    assert!(error.message().starts_with("Cannot resolve global member or argument 'Missing'."));
    assert!(error.message().contains("Limit"));
    assert!(error.message().contains("Int32Prop"));
}

#[test]
fn nested_property_chain() {
    let context = TestUtils::context();
    let child = testing::new_test_object();
    testing::set_field(&child, "Int32Prop", Value::Int32(77));
    testing::set_field(context.global(), "TestObjectProp", child);

    let tree = property(name("TestObjectProp"), "Int32Prop");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(77));
}

#[test]
fn member_of_null_target() {
    let context = TestUtils::context();
    let plain = property(name("TestObjectProp"), "Int32Prop");
    assert_eq!(TestUtils::error_code(plain, &context), ErrorCode::ExecNullReference);

    let propagated = property_or_null(name("TestObjectProp"), "Int32Prop");
    assert_eq!(TestUtils::evaluate(propagated, &context).unwrap(), Value::Null);
}

#[test]
fn null_propagation_is_inherited_along_the_chain() {
    let context = TestUtils::context();
    let tree = property(
        property_or_null(name("TestObjectProp"), "TestObjectProp"),
        "Int32Prop",
    );
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Null);
}

#[test]
fn context_wide_null_propagation() {
    let context = TestUtils::builder()
        .config(EvaluationConfig::default().with_auto_null_propagation(true))
        .build();
    let tree = property(name("TestObjectProp"), "Int32Prop");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Null);
}

#[test]
fn static_property_through_type_name() {
    let context = TestUtils::context();
    let tree = property(name("UTestObject"), "Int32Prop");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(123));
}

#[test]
fn missing_static_member_names_the_type() {
    let context = TestUtils::context();
    let tree = property(name("UTestObject"), "Missing");
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::BindStaticMemberNotFound);
    assert!(error.message().starts_with("Cannot find static member 'Missing' on type 'UTestObject'."));
}

#[test]
fn missing_instance_member_lists_properties() {
    let context = TestUtils::context();
    let tree = property(name("Int32Prop"), "Missing");
    let error = TestUtils::evaluate(tree, &context).unwrap_err();
    assert_eq!(error.code(), ErrorCode::BindMemberNotFound);
    assert!(error.message().starts_with("Cannot find member 'Missing' on type 'int32'."));
}

#[test]
fn members_resolve_on_the_runtime_type() {
    let actor = testing::new_test_actor();
    testing::set_field(&actor, "Label", Value::string("hero"));
    let context = TestUtils::context();
    testing::set_field(context.global(), "TestObjectProp", actor);

    let tree = property(name("TestObjectProp"), "Label");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::string("hero"));
}

#[test]
fn surrogate_properties_on_primitives() {
    let context = TestUtils::builder().argument("Word", "hello").build();
    let tree = property(name("Word"), "Length");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(5));
}

#[test]
fn container_count() {
    let context = TestUtils::context();
    let tree = property(name("Int32Array"), "Count");
    assert_eq!(TestUtils::evaluate(tree, &context).unwrap(), Value::Int32(0));
}
