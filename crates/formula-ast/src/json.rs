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

//! Reader for the JSON wire format of expression trees
//!
//! Every node is a JSON object tagged with `expressionType`. List attributes
//! accept either a JSON array or an object keyed `"0"`, `"1"`, ... and type
//! references accept either a type name or an object with `name`, an optional
//! enclosing `expression` and generic `arguments`.

use formula_engine_core::{BinaryOperation, FormulaError, Result, TypeReference, UnaryOperation};
use log::{debug, warn};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::binding::{ElementInit, MemberBinding};
use crate::expression::{
    Arguments, BinaryExpression, ConditionExpression, ConstantExpression, ConstantLiteral, ConversionKind,
    ConvertExpression, DefaultExpression, Expression, ExpressionRef, IndexExpression,
    InvokeExpression, LambdaExpression, ListInitExpression, MemberExpression,
    MemberInitExpression, NewArrayBoundsExpression, NewArrayInitExpression, NewExpression,
    TypeIsExpression, TypeOfExpression, UnaryExpression,
};
use crate::notation::*;

type Object = Map<String, Value>;

/// Read an expression tree from JSON text
pub fn from_json_str(text: &str) -> Result<ExpressionRef> {
    let json: Value = serde_json::from_str(text)
        .map_err(|error| FormulaError::invalid_expression(format!("Malformed JSON: {error}.")))?;
    from_json(&json)
}

/// Read an expression tree from a parsed JSON document
pub fn from_json(json: &Value) -> Result<ExpressionRef> {
    read_expression(json)
}

fn read_expression(json: &Value) -> Result<ExpressionRef> {
    let object = as_object(json, "expression")?;
    let expression_type = required_str(object, EXPRESSION_TYPE_ATTRIBUTE)?;

    let expression = match expression_type {
        EXPRESSION_TYPE_PROPERTY_OR_FIELD | EXPRESSION_TYPE_MEMBER_RESOLVE => {
            Expression::Member(read_member(object)?)
        }
        EXPRESSION_TYPE_CONSTANT => Expression::Constant(ConstantExpression {
            value: read_literal(object.get(VALUE_ATTRIBUTE)),
            value_type: required_type(object, TYPE_ATTRIBUTE)?,
        }),
        EXPRESSION_TYPE_CONVERT | EXPRESSION_TYPE_CONVERT_CHECKED | EXPRESSION_TYPE_TYPE_AS => {
            Expression::Convert(ConvertExpression {
                kind: ConversionKind::from_notation(expression_type)
                    .unwrap_or(ConversionKind::Convert),
                expression: required_expression(object, EXPRESSION_ATTRIBUTE)?,
                target: required_type(object, TYPE_ATTRIBUTE)?,
            })
        }
        EXPRESSION_TYPE_TYPE_IS => Expression::TypeIs(TypeIsExpression {
            expression: required_expression(object, EXPRESSION_ATTRIBUTE)?,
            target: required_type(object, TYPE_ATTRIBUTE)?,
        }),
        EXPRESSION_TYPE_TYPE_OF => Expression::TypeOf(TypeOfExpression {
            target: required_type(object, TYPE_ATTRIBUTE)?,
        }),
        EXPRESSION_TYPE_DEFAULT => Expression::Default(DefaultExpression {
            target: required_type(object, TYPE_ATTRIBUTE)?,
        }),
        EXPRESSION_TYPE_CONDITION => Expression::Condition(ConditionExpression {
            test: required_expression(object, TEST_ATTRIBUTE)?,
            if_true: required_expression(object, IF_TRUE_ATTRIBUTE)?,
            if_false: required_expression(object, IF_FALSE_ATTRIBUTE)?,
        }),
        EXPRESSION_TYPE_INDEX => Expression::Index(IndexExpression {
            expression: required_expression(object, EXPRESSION_ATTRIBUTE)?,
            arguments: read_arguments(object)?,
            use_null_propagation: read_null_propagation(object),
        }),
        EXPRESSION_TYPE_INVOKE => Expression::Invoke(InvokeExpression {
            expression: required_expression(object, EXPRESSION_ATTRIBUTE)?,
            arguments: read_arguments(object)?,
        }),
        EXPRESSION_TYPE_LAMBDA => Expression::Lambda(read_lambda(object)?),
        EXPRESSION_TYPE_NEW => Expression::New(read_new(object)?),
        EXPRESSION_TYPE_NEW_ARRAY_BOUNDS => {
            Expression::NewArrayBounds(NewArrayBoundsExpression {
                array_type: required_type(object, TYPE_ATTRIBUTE)?,
                arguments: read_arguments(object)?,
            })
        }
        EXPRESSION_TYPE_NEW_ARRAY_INIT => Expression::NewArrayInit(NewArrayInitExpression {
            array_type: required_type(object, TYPE_ATTRIBUTE)?,
            initializers: list(object, ARGUMENTS_ATTRIBUTE)
                .into_iter()
                .map(read_expression)
                .collect::<Result<_>>()?,
        }),
        EXPRESSION_TYPE_MEMBER_INIT => Expression::MemberInit(MemberInitExpression {
            new: required_new(object)?,
            bindings: list(object, BINDINGS_ATTRIBUTE)
                .into_iter()
                .map(read_binding)
                .collect::<Result<_>>()?,
        }),
        EXPRESSION_TYPE_LIST_INIT => Expression::ListInit(ListInitExpression {
            new: required_new(object)?,
            initializers: read_element_inits(object)?,
        }),
        other => {
            if let Some(operation) = BinaryOperation::from_notation(other) {
                Expression::Binary(BinaryExpression {
                    operation,
                    left: required_expression(object, LEFT_ATTRIBUTE)?,
                    right: required_expression(object, RIGHT_ATTRIBUTE)?,
                })
            } else if let Some(operation) = UnaryOperation::from_notation(other) {
                Expression::Unary(UnaryExpression {
                    operation,
                    expression: required_expression(object, EXPRESSION_ATTRIBUTE)?,
                })
            } else {
                debug!("unknown expression type '{other}'");
                return Err(FormulaError::unsupported_expression(other));
            }
        }
    };
    Ok(expression.into_ref())
}

fn read_member(object: &Object) -> Result<MemberExpression> {
    let expression = optional_expression(object, EXPRESSION_ATTRIBUTE)?;
    let type_arguments = list(object, ARGUMENTS_ATTRIBUTE)
        .into_iter()
        .map(read_type_reference)
        .collect::<Result<Vec<_>>>()?;
    Ok(MemberExpression::new(expression, raw_member_name(object))
        .with_null_propagation(read_null_propagation(object))
        .with_type_arguments(type_arguments))
}

fn read_lambda(object: &Object) -> Result<LambdaExpression> {
    let mut parameters = SmallVec::new();
    for (key, argument) in read_arguments(object)? {
        match argument.as_member() {
            Some(member) => parameters.push(member.name().to_string()),
            None => warn!("lambda parameter '{key}' is not a member expression and is skipped"),
        }
    }
    Ok(LambdaExpression {
        parameters,
        body: required_expression(object, EXPRESSION_ATTRIBUTE)?,
    })
}

fn read_new(object: &Object) -> Result<NewExpression> {
    Ok(NewExpression {
        target: required_type(object, TYPE_ATTRIBUTE)?,
        arguments: read_arguments(object)?,
    })
}

fn required_new(object: &Object) -> Result<NewExpression> {
    let new = object
        .get(NEW_ATTRIBUTE)
        .ok_or_else(|| missing_attribute(NEW_ATTRIBUTE))?;
    let new_object = as_object(new, NEW_ATTRIBUTE)?;
    match required_str(new_object, EXPRESSION_TYPE_ATTRIBUTE)? {
        EXPRESSION_TYPE_NEW => read_new(new_object),
        other => Err(FormulaError::invalid_expression(format!(
            "Attribute '{NEW_ATTRIBUTE}' must be a '{EXPRESSION_TYPE_NEW}' expression, found '{other}'."
        ))),
    }
}

fn read_binding(json: &Value) -> Result<MemberBinding> {
    let object = as_object(json, BINDINGS_ATTRIBUTE)?;
    let raw_name = raw_member_name(object);
    match required_str(object, EXPRESSION_TYPE_ATTRIBUTE)? {
        EXPRESSION_TYPE_ASSIGNMENT_BINDING => Ok(MemberBinding::assignment(
            raw_name,
            required_expression(object, EXPRESSION_ATTRIBUTE)?,
        )),
        EXPRESSION_TYPE_MEMBER_BINDING => Ok(MemberBinding::member(
            raw_name,
            list(object, BINDINGS_ATTRIBUTE)
                .into_iter()
                .map(read_binding)
                .collect::<Result<_>>()?,
        )),
        EXPRESSION_TYPE_LIST_BINDING => {
            Ok(MemberBinding::list(raw_name, read_element_inits(object)?))
        }
        other => Err(FormulaError::unsupported_expression(other)),
    }
}

fn read_element_inits(object: &Object) -> Result<Vec<ElementInit>> {
    list(object, INITIALIZERS_ATTRIBUTE)
        .into_iter()
        .map(read_element_init)
        .collect()
}

/// An `ElementInitBinding` node, or a bare expression adding one element
fn read_element_init(json: &Value) -> Result<ElementInit> {
    let object = as_object(json, INITIALIZERS_ATTRIBUTE)?;
    if object.get(EXPRESSION_TYPE_ATTRIBUTE).and_then(Value::as_str)
        == Some(EXPRESSION_TYPE_ELEMENT_INIT_BINDING)
    {
        let initializers = list(object, INITIALIZERS_ATTRIBUTE)
            .into_iter()
            .map(read_expression)
            .collect::<Result<_>>()?;
        Ok(ElementInit::new(initializers))
    } else {
        read_expression(json).map(ElementInit::single)
    }
}

fn read_arguments(object: &Object) -> Result<Arguments> {
    let mut arguments = Arguments::new();
    match object.get(ARGUMENTS_ATTRIBUTE) {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                arguments.insert(index.to_string(), read_expression(item)?);
            }
        }
        Some(Value::Object(items)) => {
            for (key, item) in items {
                if !item.is_object() {
                    warn!("argument '{key}' is not an expression node and is skipped");
                    continue;
                }
                arguments.insert(key.clone(), read_expression(item)?);
            }
        }
        Some(other) => {
            warn!("'{ARGUMENTS_ATTRIBUTE}' attribute ignored, unexpected value {other}");
        }
    }
    Ok(arguments)
}

/// Items of a list attribute, in order. Missing attributes read as empty.
fn list<'a>(object: &'a Object, attribute: &str) -> Vec<&'a Value> {
    match object.get(attribute) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(items)) => (0..)
            .map_while(|index: usize| items.get(&index.to_string()))
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!("'{attribute}' attribute ignored, expected a list but found {other}");
            Vec::new()
        }
    }
}

/// Read a type reference from a type name or a `{name, expression?, arguments?}` object
pub fn read_type_reference(json: &Value) -> Result<TypeReference> {
    match json {
        Value::String(name) => {
            Ok(TypeReference::parse(name).unwrap_or_else(|_| TypeReference::new(name.as_str())))
        }
        Value::Object(object) => {
            let name = object
                .get(NAME_ATTRIBUTE)
                .and_then(Value::as_str)
                .unwrap_or_default();
            let arguments = list(object, ARGUMENTS_ATTRIBUTE)
                .into_iter()
                .map(read_type_reference)
                .collect::<Result<Vec<_>>>()?;
            let reference = match object.get(EXPRESSION_ATTRIBUTE) {
                Some(outer) if !outer.is_null() => {
                    TypeReference::nested(read_type_reference(outer)?, name)
                }
                _ => TypeReference::new(name),
            };
            Ok(reference.with_arguments(arguments))
        }
        other => Err(FormulaError::invalid_expression(format!(
            "Type reference must be a name or an object, found {other}."
        ))),
    }
}

fn read_literal(value: Option<&Value>) -> ConstantLiteral {
    match value {
        None | Some(Value::Null) => ConstantLiteral::Null,
        Some(Value::Bool(value)) => ConstantLiteral::Boolean(*value),
        Some(Value::Number(number)) => {
            if let Some(value) = number.as_i64() {
                ConstantLiteral::Integer(value.into())
            } else if let Some(value) = number.as_u64() {
                ConstantLiteral::Integer(value.into())
            } else {
                number
                    .as_f64()
                    .map_or(ConstantLiteral::Null, ConstantLiteral::Float)
            }
        }
        Some(Value::String(value)) => ConstantLiteral::String(value.clone()),
        Some(other) => {
            warn!("constant value {other} is not a literal and reads as null");
            ConstantLiteral::Null
        }
    }
}

fn raw_member_name(object: &Object) -> String {
    object
        .get(PROPERTY_OR_FIELD_NAME_ATTRIBUTE)
        .and_then(Value::as_str)
        .or_else(|| object.get(NAME_ATTRIBUTE).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn read_null_propagation(object: &Object) -> bool {
    object
        .get(USE_NULL_PROPAGATION_ATTRIBUTE)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn as_object<'a>(json: &'a Value, context: &str) -> Result<&'a Object> {
    json.as_object().ok_or_else(|| {
        FormulaError::invalid_expression(format!("'{context}' must be a JSON object, found {json}."))
    })
}

fn required_str<'a>(object: &'a Object, attribute: &str) -> Result<&'a str> {
    object
        .get(attribute)
        .and_then(Value::as_str)
        .ok_or_else(|| missing_attribute(attribute))
}

fn required_expression(object: &Object, attribute: &str) -> Result<ExpressionRef> {
    optional_expression(object, attribute)?.ok_or_else(|| missing_attribute(attribute))
}

fn optional_expression(object: &Object, attribute: &str) -> Result<Option<ExpressionRef>> {
    match object.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => read_expression(value).map(Some),
    }
}

fn required_type(object: &Object, attribute: &str) -> Result<TypeReference> {
    match object.get(attribute) {
        None | Some(Value::Null) => Err(missing_attribute(attribute)),
        Some(value) => read_type_reference(value),
    }
}

fn missing_attribute(attribute: &str) -> FormulaError {
    FormulaError::invalid_expression(format!("Missing required attribute '{attribute}'."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::MemberBindingKind;
    use formula_engine_core::ErrorCode;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn constant(value: Value, ty: &str) -> Value {
        json!({"expressionType": "Constant", "value": value, "type": ty})
    }

    #[test]
    fn test_member_chain() {
        let expression = from_json(&json!({
            "expressionType": "PropertyOrField",
            "propertyOrFieldName": "Int32Prop",
            "useNullPropagation": true,
            "expression": {"expressionType": "MemberResolve", "name": "@Global"}
        }))
        .unwrap();

        let member = expression.as_member().unwrap();
        assert_eq!(member.name(), "Int32Prop");
        assert!(member.use_null_propagation());
        let base = member.expression().unwrap().as_member().unwrap();
        assert_eq!(base.raw_name(), "@Global");
        assert_eq!(base.name(), "Global");
    }

    #[test]
    fn test_binary_and_constant() {
        let expression = from_json(&json!({
            "expressionType": "AddChecked",
            "left": constant(json!(2), "int32"),
            "right": constant(json!(2.5), "System.Double")
        }))
        .unwrap();

        let Expression::Binary(binary) = expression.as_ref() else {
            panic!("expected a binary node, got {expression:?}");
        };
        assert_eq!(binary.operation, BinaryOperation::AddChecked);
        let Expression::Constant(right) = binary.right.as_ref() else {
            panic!("expected a constant");
        };
        assert_eq!(right.value, ConstantLiteral::Float(2.5));
        assert_eq!(right.value_type.full_name(false), "System.Double");
    }

    #[test]
    fn test_unary_and_conversion_kinds() {
        let expression = from_json(&json!({
            "expressionType": "TypeAs",
            "type": "UTestObject",
            "expression": {
                "expressionType": "Negate",
                "expression": constant(json!(1), "int32")
            }
        }))
        .unwrap();
        let Expression::Convert(convert) = expression.as_ref() else {
            panic!("expected a convert node");
        };
        assert_eq!(convert.kind, ConversionKind::TypeAs);
        assert!(matches!(convert.expression.as_ref(), Expression::Unary(unary)
            if unary.operation == UnaryOperation::Negate));
    }

    #[test]
    fn test_type_reference_object_form() {
        let reference = read_type_reference(&json!({
            "name": "Dictionary",
            "expression": {"name": "Generic", "expression": "System.Collections"},
            "arguments": {"0": "FString", "1": {"name": "int32"}}
        }))
        .unwrap();
        assert_eq!(
            reference.full_name(true),
            "System.Collections.Generic.Dictionary<FString, int32>"
        );
    }

    #[test]
    fn test_keyed_lists_keep_order() {
        let expression = from_json(&json!({
            "expressionType": "NewArrayInit",
            "type": "System.Array<int32>",
            "arguments": {
                "0": constant(json!(1), "int32"),
                "1": constant(json!(2), "int32"),
                "3": constant(json!(4), "int32")
            }
        }))
        .unwrap();
        let Expression::NewArrayInit(init) = expression.as_ref() else {
            panic!("expected an array initializer");
        };
        assert_eq!(init.initializers.len(), 2);
        assert_eq!(init.array_type.type_arguments().len(), 1);
    }

    #[test]
    fn test_member_init_bindings() {
        let expression = from_json(&json!({
            "expressionType": "MemberInit",
            "new": {"expressionType": "New", "type": "UTestObject"},
            "bindings": [
                {"expressionType": "Assignment", "name": "Int32Prop",
                 "expression": constant(json!(5), "int32")},
                {"expressionType": "MemberBinding", "name": "TestStructProp", "bindings": [
                    {"expressionType": "Assignment", "name": "Int32Field",
                     "expression": constant(json!(6), "int32")}
                ]},
                {"expressionType": "ListBinding", "name": "Int32Map", "initializers": [
                    {"expressionType": "ElementInitBinding", "initializers": [
                        constant(json!("a"), "FString"), constant(json!(1), "int32")
                    ]}
                ]}
            ]
        }))
        .unwrap();
        let Expression::MemberInit(init) = expression.as_ref() else {
            panic!("expected a member initializer");
        };
        assert_eq!(init.new.target.name(), "UTestObject");
        assert_eq!(init.bindings.len(), 3);
        assert!(matches!(init.bindings[1].kind, MemberBindingKind::MemberMember(ref inner) if inner.len() == 1));
        assert!(matches!(init.bindings[2].kind, MemberBindingKind::List(ref inits)
            if inits[0].initializers.len() == 2));
    }

    #[test]
    fn test_invoke_arguments_keep_document_order() {
        let expression = from_json(&json!({
            "expressionType": "Invoke",
            "expression": {"expressionType": "PropertyOrField", "name": "Max"},
            "arguments": {
                "b": constant(json!(1), "int32"),
                "a": constant(json!(2), "int32"),
                "skipped": 3
            }
        }))
        .unwrap();
        let Expression::Invoke(invoke) = expression.as_ref() else {
            panic!("expected an invoke node");
        };
        assert_eq!(invoke.arguments.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_unknown_expression_type() {
        let error = from_json(&json!({"expressionType": "Loop"})).unwrap_err();
        assert_eq!(error.code(), ErrorCode::ExecUnsupportedExpression);
        assert_eq!(
            error.message(),
            "Expression type 'Loop' is not supported."
        );
    }

    #[test]
    fn test_missing_attribute() {
        let error = from_json(&json!({"expressionType": "Add", "left": constant(json!(1), "int32")}))
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::ExecExpressionIsInvalid);
        assert!(error.message().contains("'right'"));
    }

    #[test]
    fn test_member_init_requires_new_node() {
        let error = from_json(&json!({
            "expressionType": "MemberInit",
            "new": constant(json!(1), "int32"),
            "bindings": []
        }))
        .unwrap_err();
        assert_eq!(error.code(), ErrorCode::ExecExpressionIsInvalid);
    }

    #[rstest]
    #[case(json!(true), ConstantLiteral::Boolean(true))]
    #[case(json!(-7), ConstantLiteral::Integer(-7))]
    #[case(json!(u64::MAX), ConstantLiteral::Integer(u64::MAX as i128))]
    #[case(json!(0.25), ConstantLiteral::Float(0.25))]
    #[case(json!("text"), ConstantLiteral::String("text".into()))]
    #[case(json!(null), ConstantLiteral::Null)]
    #[case(json!([1]), ConstantLiteral::Null)]
    fn test_constant_literals(#[case] value: Value, #[case] expected: ConstantLiteral) {
        assert_eq!(read_literal(Some(&value)), expected);
    }

    #[test]
    fn test_malformed_text() {
        let error = from_json_str("{ not json").unwrap_err();
        assert_eq!(error.code(), ErrorCode::ExecExpressionIsInvalid);
    }
}
