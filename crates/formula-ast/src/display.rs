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

//! C#-like rendering of expression trees for logs and diagnostics

use std::fmt::{self, Display, Formatter, Write};

use formula_engine_core::{TypeReference, UnaryOperation};

use crate::binding::{ElementInit, MemberBinding, MemberBindingKind};
use crate::expression::{
    Arguments, ConstantLiteral, ConversionKind, Expression, NewExpression,
};

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Member(member) => {
                if let Some(target) = member.expression() {
                    write!(f, "{target}")?;
                    f.write_str(if member.use_null_propagation() { "?." } else { "." })?;
                }
                f.write_str(member.raw_name())?;
                write_type_arguments(f, member.type_arguments())
            }
            Expression::Constant(constant) => write!(f, "{}", constant.value),
            Expression::Binary(binary) => {
                write!(f, "({} {} {})", binary.left, binary.operation, binary.right)
            }
            Expression::Unary(unary) => match unary.operation {
                UnaryOperation::Group => write!(f, "({})", unary.expression),
                UnaryOperation::CheckedScope | UnaryOperation::UncheckedScope => {
                    write!(f, "{}({})", unary.operation, unary.expression)
                }
                operation => write!(f, "{operation}{}", unary.expression),
            },
            Expression::Convert(convert) => match convert.kind {
                ConversionKind::Convert => write!(f, "({}){}", convert.target, convert.expression),
                ConversionKind::ConvertChecked => {
                    write!(f, "checked(({}){})", convert.target, convert.expression)
                }
                ConversionKind::TypeAs => write!(f, "{} as {}", convert.expression, convert.target),
            },
            Expression::TypeIs(type_is) => write!(f, "{} is {}", type_is.expression, type_is.target),
            Expression::TypeOf(type_of) => write!(f, "typeof({})", type_of.target),
            Expression::Default(default) => write!(f, "default({})", default.target),
            Expression::Condition(condition) => write!(
                f,
                "({} ? {} : {})",
                condition.test, condition.if_true, condition.if_false
            ),
            Expression::Index(index) => {
                write!(f, "{}", index.expression)?;
                f.write_str(if index.use_null_propagation { "?[" } else { "[" })?;
                write_arguments(f, &index.arguments)?;
                f.write_char(']')
            }
            Expression::Invoke(invoke) => {
                write!(f, "{}(", invoke.expression)?;
                write_arguments(f, &invoke.arguments)?;
                f.write_char(')')
            }
            Expression::Lambda(lambda) => {
                write!(f, "({}) => {}", lambda.parameters.join(", "), lambda.body)
            }
            Expression::New(new) => write!(f, "{}", DisplayNew(new)),
            Expression::NewArrayBounds(bounds) => {
                write!(f, "new {}[", element_type(&bounds.array_type))?;
                write_arguments(f, &bounds.arguments)?;
                f.write_char(']')
            }
            Expression::NewArrayInit(init) => {
                write!(f, "new {}[] {{ ", element_type(&init.array_type))?;
                write_separated(f, &init.initializers)?;
                f.write_str(" }")
            }
            Expression::MemberInit(init) => {
                write!(f, "{} {{ ", DisplayNew(&init.new))?;
                write_separated(f, &init.bindings)?;
                f.write_str(" }")
            }
            Expression::ListInit(init) => {
                write!(f, "{} {{ ", DisplayNew(&init.new))?;
                write_separated(f, &init.initializers)?;
                f.write_str(" }")
            }
        }
    }
}

impl Display for ConstantLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstantLiteral::Null => f.write_str("null"),
            ConstantLiteral::Boolean(value) => write!(f, "{value}"),
            ConstantLiteral::Integer(value) => write!(f, "{value}"),
            ConstantLiteral::Float(value) => write!(f, "{value}"),
            ConstantLiteral::String(value) => write!(f, "{value:?}"),
        }
    }
}

impl Display for MemberBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.raw_name())?;
        match &self.kind {
            MemberBindingKind::Assignment(expression) => write!(f, "{expression}"),
            MemberBindingKind::MemberMember(bindings) => {
                f.write_str("{ ")?;
                write_separated(f, bindings)?;
                f.write_str(" }")
            }
            MemberBindingKind::List(initializers) => {
                f.write_str("{ ")?;
                write_separated(f, initializers)?;
                f.write_str(" }")
            }
        }
    }
}

impl Display for ElementInit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.initializers.as_slice() {
            [single] => write!(f, "{single}"),
            initializers => {
                f.write_str("{ ")?;
                write_separated(f, initializers)?;
                f.write_str(" }")
            }
        }
    }
}

struct DisplayNew<'a>(&'a NewExpression);

impl Display for DisplayNew<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "new {}(", self.0.target)?;
        write_arguments(f, &self.0.arguments)?;
        f.write_char(')')
    }
}

/// `System.Array<T>` renders as `T` in array creation
fn element_type(array_type: &TypeReference) -> String {
    match array_type.type_arguments() {
        [element] => element.full_name(true).to_string(),
        _ => array_type.full_name(true).to_string(),
    }
}

fn write_type_arguments(f: &mut Formatter<'_>, type_arguments: &[TypeReference]) -> fmt::Result {
    if type_arguments.is_empty() {
        return Ok(());
    }
    f.write_char('<')?;
    write_separated(f, type_arguments)?;
    f.write_char('>')
}

/// Positional arguments render bare, named ones as `name: value`
fn write_arguments(f: &mut Formatter<'_>, arguments: &Arguments) -> fmt::Result {
    for (i, (key, value)) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if key.parse::<usize>().is_err() {
            write!(f, "{key}: ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

fn write_separated<T: Display>(f: &mut Formatter<'_>, values: &[T]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{
        ExpressionRef, ListInitExpression, MemberInitExpression, NewArrayInitExpression, positional_arguments,
    };
    use formula_engine_core::BinaryOperation;
    use pretty_assertions::assert_eq;

    fn int(value: i128) -> ExpressionRef {
        Expression::constant(ConstantLiteral::Integer(value), TypeReference::new("int32"))
    }

    #[test]
    fn test_member_and_operators() {
        let global = Expression::name("@Global");
        let expression = Expression::binary(
            BinaryOperation::AddChecked,
            Expression::property_or_null(global.clone(), "Int32Prop"),
            Expression::unary(UnaryOperation::Negate, int(2)),
        );
        assert_eq!(expression.to_string(), "(@Global?.Int32Prop + -2)");

        let grouped = Expression::unary(UnaryOperation::CheckedScope, Expression::property(global, "A"));
        assert_eq!(grouped.to_string(), "checked(@Global.A)");
    }

    #[test]
    fn test_conversions_and_conditions() {
        let value = Expression::constant(
            ConstantLiteral::String("a\"b".into()),
            TypeReference::new("FString"),
        );
        let cast = Expression::convert(ConversionKind::TypeAs, value, TypeReference::new("UObject"));
        assert_eq!(cast.to_string(), r#""a\"b" as UObject"#);

        let condition = Expression::condition(
            Expression::name("true"),
            int(1),
            Expression::convert(ConversionKind::ConvertChecked, int(2), TypeReference::new("uint8")),
        );
        assert_eq!(condition.to_string(), "(true ? 1 : checked((uint8)2))");
    }

    #[test]
    fn test_calls_and_indexers() {
        let mut arguments = positional_arguments([int(1)]);
        arguments.insert("InValue".into(), int(2));
        let call = Expression::invoke(
            Expression::property(Expression::name("Target"), "Call"),
            arguments,
        );
        assert_eq!(call.to_string(), "Target.Call(1, InValue: 2)");

        let index = Expression::index(Expression::name("Int32Array"), positional_arguments([int(0)]));
        assert_eq!(index.to_string(), "Int32Array[0]");
    }

    #[test]
    fn test_initializers() {
        let array = Expression::NewArrayInit(NewArrayInitExpression {
            array_type: TypeReference::new("System.Array")
                .with_arguments(vec![TypeReference::new("int32")]),
            initializers: vec![int(1), int(2)],
        });
        assert_eq!(array.to_string(), "new int32[] { 1, 2 }");

        let object = Expression::MemberInit(MemberInitExpression {
            new: NewExpression::new(TypeReference::new("UTestObject")),
            bindings: vec![
                MemberBinding::assignment("Int32Prop", int(5)),
                MemberBinding::member(
                    "TestStructProp",
                    vec![MemberBinding::assignment("Int32Field", int(6))],
                ),
                MemberBinding::list("Int32Array", vec![ElementInit::single(int(7))]),
            ],
        });
        assert_eq!(
            object.to_string(),
            "new UTestObject() { Int32Prop = 5, TestStructProp = { Int32Field = 6 }, Int32Array = { 7 } }"
        );

        let map = Expression::ListInit(ListInitExpression {
            new: NewExpression::new(
                TypeReference::new("TMap")
                    .with_arguments(vec![TypeReference::new("FString"), TypeReference::new("int32")]),
            ),
            initializers: vec![ElementInit::pair(
                Expression::constant(ConstantLiteral::String("a".into()), TypeReference::new("FString")),
                int(1),
            )],
        });
        assert_eq!(map.to_string(), r#"new TMap<FString, int32>() { { "a", 1 } }"#);
    }
}
