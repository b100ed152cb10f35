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

//! Expression tree node definitions
//!
//! Trees are immutable once built and share their children through
//! [`ExpressionRef`], so one tree can be evaluated many times and from several
//! threads.

use std::sync::Arc;

use formula_engine_core::{BinaryOperation, TypeReference, UnaryOperation};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use crate::binding::{ElementInit, MemberBinding};
use crate::notation;

/// Shared handle to an expression node
pub type ExpressionRef = Arc<Expression>;

/// Call and index arguments keyed by parameter name or position (`"0"`, `"1"`, ...)
pub type Arguments = IndexMap<String, ExpressionRef>;

/// Arguments keyed by their position
pub fn positional_arguments(values: impl IntoIterator<Item = ExpressionRef>) -> Arguments {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| (index.to_string(), value))
        .collect()
}

/// A node of a serialized formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Property, field, argument or type name access (`a.b`, `a?.b`, `b`)
    Member(MemberExpression),
    /// Literal converted to a declared type
    Constant(ConstantExpression),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    /// Cast or safe cast (`(T)x`, `x as T`)
    Convert(ConvertExpression),
    TypeIs(TypeIsExpression),
    TypeOf(TypeOfExpression),
    Default(DefaultExpression),
    Condition(ConditionExpression),
    Index(IndexExpression),
    Invoke(InvokeExpression),
    /// Parsed but never evaluated
    Lambda(LambdaExpression),
    New(NewExpression),
    NewArrayBounds(NewArrayBoundsExpression),
    NewArrayInit(NewArrayInitExpression),
    MemberInit(MemberInitExpression),
    ListInit(ListInitExpression),
}

/// Fast node kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExpressionType {
    Member = 0,
    Constant = 1,
    Binary = 2,
    Unary = 3,
    Convert = 4,
    TypeIs = 5,
    TypeOf = 6,
    Default = 7,
    Condition = 8,
    Index = 9,
    Invoke = 10,
    Lambda = 11,
    New = 12,
    NewArrayBounds = 13,
    NewArrayInit = 14,
    MemberInit = 15,
    ListInit = 16,
}

impl Expression {
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Expression::Member(_) => ExpressionType::Member,
            Expression::Constant(_) => ExpressionType::Constant,
            Expression::Binary(_) => ExpressionType::Binary,
            Expression::Unary(_) => ExpressionType::Unary,
            Expression::Convert(_) => ExpressionType::Convert,
            Expression::TypeIs(_) => ExpressionType::TypeIs,
            Expression::TypeOf(_) => ExpressionType::TypeOf,
            Expression::Default(_) => ExpressionType::Default,
            Expression::Condition(_) => ExpressionType::Condition,
            Expression::Index(_) => ExpressionType::Index,
            Expression::Invoke(_) => ExpressionType::Invoke,
            Expression::Lambda(_) => ExpressionType::Lambda,
            Expression::New(_) => ExpressionType::New,
            Expression::NewArrayBounds(_) => ExpressionType::NewArrayBounds,
            Expression::NewArrayInit(_) => ExpressionType::NewArrayInit,
            Expression::MemberInit(_) => ExpressionType::MemberInit,
            Expression::ListInit(_) => ExpressionType::ListInit,
        }
    }

    /// Whether a null target anywhere along the left-hand chain yields null
    pub fn is_null_propagation_enabled(&self) -> bool {
        match self {
            Expression::Member(member) => member.is_null_propagation_enabled(),
            Expression::Index(index) => {
                index.use_null_propagation || index.expression.is_null_propagation_enabled()
            }
            Expression::Invoke(invoke) => invoke.expression.is_null_propagation_enabled(),
            _ => false,
        }
    }

    pub fn as_member(&self) -> Option<&MemberExpression> {
        match self {
            Expression::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn into_ref(self) -> ExpressionRef {
        Arc::new(self)
    }

    // Construction helpers

    /// Bare name resolved against literals, arguments and the global object
    pub fn name(name: impl Into<String>) -> ExpressionRef {
        Expression::Member(MemberExpression::new(None, name)).into_ref()
    }

    pub fn property(target: ExpressionRef, name: impl Into<String>) -> ExpressionRef {
        Expression::Member(MemberExpression::new(Some(target), name)).into_ref()
    }

    /// `target?.name`
    pub fn property_or_null(target: ExpressionRef, name: impl Into<String>) -> ExpressionRef {
        Expression::Member(MemberExpression::new(Some(target), name).with_null_propagation(true))
            .into_ref()
    }

    pub fn constant(value: ConstantLiteral, value_type: TypeReference) -> ExpressionRef {
        Expression::Constant(ConstantExpression { value, value_type }).into_ref()
    }

    pub fn binary(
        operation: BinaryOperation,
        left: ExpressionRef,
        right: ExpressionRef,
    ) -> ExpressionRef {
        Expression::Binary(BinaryExpression {
            operation,
            left,
            right,
        })
        .into_ref()
    }

    pub fn unary(operation: UnaryOperation, expression: ExpressionRef) -> ExpressionRef {
        Expression::Unary(UnaryExpression {
            operation,
            expression,
        })
        .into_ref()
    }

    pub fn convert(
        kind: ConversionKind,
        expression: ExpressionRef,
        target: TypeReference,
    ) -> ExpressionRef {
        Expression::Convert(ConvertExpression {
            kind,
            expression,
            target,
        })
        .into_ref()
    }

    pub fn condition(
        test: ExpressionRef,
        if_true: ExpressionRef,
        if_false: ExpressionRef,
    ) -> ExpressionRef {
        Expression::Condition(ConditionExpression {
            test,
            if_true,
            if_false,
        })
        .into_ref()
    }

    pub fn index(expression: ExpressionRef, arguments: Arguments) -> ExpressionRef {
        Expression::Index(IndexExpression {
            expression,
            arguments,
            use_null_propagation: false,
        })
        .into_ref()
    }

    pub fn invoke(expression: ExpressionRef, arguments: Arguments) -> ExpressionRef {
        Expression::Invoke(InvokeExpression {
            expression,
            arguments,
        })
        .into_ref()
    }
}

impl From<MemberExpression> for Expression {
    fn from(member: MemberExpression) -> Self {
        Expression::Member(member)
    }
}

impl From<NewExpression> for Expression {
    fn from(new: NewExpression) -> Self {
        Expression::New(new)
    }
}

/// Member access
///
/// A chain of member expressions with no null propagation can also name a
/// type: `System.Math.PI` is the static member `PI` of the type
/// `System.Math`. Both readings of the chain are computed once and kept on the
/// node.
#[derive(Debug, Clone)]
pub struct MemberExpression {
    expression: Option<ExpressionRef>,
    raw_name: String,
    name: String,
    use_null_propagation: bool,
    type_arguments: Vec<TypeReference>,
    type_reference: OnceCell<Option<TypeReference>>,
    declaring_type_reference: OnceCell<Option<TypeReference>>,
}

impl MemberExpression {
    /// `raw_name` may carry a verbatim `@` marker, which is stripped for lookup
    pub fn new(expression: Option<ExpressionRef>, raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        Self {
            expression,
            name: notation::member_name(&raw_name).to_string(),
            raw_name,
            use_null_propagation: false,
            type_arguments: Vec::new(),
            type_reference: OnceCell::new(),
            declaring_type_reference: OnceCell::new(),
        }
    }

    pub fn with_null_propagation(mut self, use_null_propagation: bool) -> Self {
        self.use_null_propagation = use_null_propagation;
        self.reset_type_references();
        self
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<TypeReference>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    fn reset_type_references(&mut self) {
        self.type_reference = OnceCell::new();
        self.declaring_type_reference = OnceCell::new();
    }

    pub fn expression(&self) -> Option<&ExpressionRef> {
        self.expression.as_ref()
    }

    /// Member name for lookup
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member name as written, used for literal and argument matching
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn use_null_propagation(&self) -> bool {
        self.use_null_propagation
    }

    /// Generic arguments of an invoked member
    pub fn type_arguments(&self) -> &[TypeReference] {
        &self.type_arguments
    }

    pub fn is_null_propagation_enabled(&self) -> bool {
        self.use_null_propagation
            || self
                .expression
                .as_ref()
                .is_some_and(|expression| expression.is_null_propagation_enabled())
    }

    /// The chain read as a type name
    ///
    /// With `skip_self` the last segment is dropped, giving the type that
    /// would declare this member as a static. `None` when the chain contains
    /// anything other than plain member accesses or uses null propagation.
    pub fn type_reference(&self, skip_self: bool) -> Option<&TypeReference> {
        if self.is_null_propagation_enabled() {
            return None;
        }
        let cell = if skip_self {
            &self.declaring_type_reference
        } else {
            &self.type_reference
        };
        cell.get_or_init(|| self.build_type_reference(skip_self))
            .as_ref()
    }

    fn build_type_reference(&self, skip_self: bool) -> Option<TypeReference> {
        match self.expression.as_deref() {
            None if skip_self => None,
            None => Some(TypeReference::new(&self.name)),
            Some(Expression::Member(base)) => {
                let outer = base.type_reference(false)?.clone();
                Some(if skip_self {
                    outer
                } else {
                    TypeReference::nested(outer, &self.name)
                })
            }
            Some(_) => None,
        }
    }
}

impl PartialEq for MemberExpression {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
            && self.raw_name == other.raw_name
            && self.use_null_propagation == other.use_null_propagation
            && self.type_arguments == other.type_arguments
    }
}

/// Literal as it appears in the serialized tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantLiteral {
    Null,
    Boolean(bool),
    Integer(i128),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpression {
    pub value: ConstantLiteral,
    pub value_type: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operation: BinaryOperation,
    pub left: ExpressionRef,
    pub right: ExpressionRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operation: UnaryOperation,
    pub expression: ExpressionRef,
}

/// Conversion flavours sharing one node shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Convert,
    ConvertChecked,
    /// Yields null instead of failing on incompatible objects
    TypeAs,
}

impl ConversionKind {
    pub const fn notation_name(self) -> &'static str {
        match self {
            ConversionKind::Convert => notation::EXPRESSION_TYPE_CONVERT,
            ConversionKind::ConvertChecked => notation::EXPRESSION_TYPE_CONVERT_CHECKED,
            ConversionKind::TypeAs => notation::EXPRESSION_TYPE_TYPE_AS,
        }
    }

    pub fn from_notation(name: &str) -> Option<Self> {
        [
            ConversionKind::Convert,
            ConversionKind::ConvertChecked,
            ConversionKind::TypeAs,
        ]
        .into_iter()
        .find(|kind| kind.notation_name() == name)
    }

    pub const fn is_checked(self) -> bool {
        matches!(self, ConversionKind::ConvertChecked)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertExpression {
    pub kind: ConversionKind,
    pub expression: ExpressionRef,
    pub target: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeIsExpression {
    pub expression: ExpressionRef,
    pub target: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeOfExpression {
    pub target: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultExpression {
    pub target: TypeReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpression {
    pub test: ExpressionRef,
    pub if_true: ExpressionRef,
    pub if_false: ExpressionRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub expression: ExpressionRef,
    pub arguments: Arguments,
    pub use_null_propagation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeExpression {
    /// Callee, usually a member expression naming the function
    pub expression: ExpressionRef,
    pub arguments: Arguments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpression {
    pub parameters: SmallVec<[String; 2]>,
    pub body: ExpressionRef,
}

/// Parameterless construction
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub target: TypeReference,
    /// Always rejected at evaluation when non-empty
    pub arguments: Arguments,
}

impl NewExpression {
    pub fn new(target: TypeReference) -> Self {
        Self {
            target,
            arguments: Arguments::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArrayBoundsExpression {
    pub array_type: TypeReference,
    pub arguments: Arguments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArrayInitExpression {
    pub array_type: TypeReference,
    pub initializers: Vec<ExpressionRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInitExpression {
    pub new: NewExpression,
    pub bindings: Vec<MemberBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListInitExpression {
    pub new: NewExpression,
    pub initializers: Vec<ElementInit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(names: &[&str]) -> ExpressionRef {
        let mut expression = Expression::name(names[0]);
        for name in &names[1..] {
            expression = Expression::property(expression, *name);
        }
        expression
    }

    #[test]
    fn test_member_chain_as_type_reference() {
        let expression = chain(&["System", "Math", "PI"]);
        let member = expression.as_member().unwrap();
        assert_eq!(
            member.type_reference(true).map(|r| r.full_name(false)),
            Some("System.Math")
        );
        assert_eq!(
            member.type_reference(false).map(|r| r.full_name(false)),
            Some("System.Math.PI")
        );
    }

    #[test]
    fn test_bare_name_has_no_declaring_type() {
        let expression = Expression::name("Int32Prop");
        let member = expression.as_member().unwrap();
        assert!(member.type_reference(true).is_none());
        assert_eq!(
            member.type_reference(false).map(|r| r.name()),
            Some("Int32Prop")
        );
    }

    #[test]
    fn test_null_propagation_breaks_type_reading() {
        let expression = Expression::property(
            Expression::property_or_null(Expression::name("a"), "b"),
            "c",
        );
        let member = expression.as_member().unwrap();
        assert!(member.is_null_propagation_enabled());
        assert!(member.type_reference(true).is_none());
    }

    #[test]
    fn test_non_member_base_is_not_a_type() {
        let call = Expression::invoke(Expression::name("f"), Arguments::new());
        let expression = Expression::property(call, "Length");
        assert!(expression.as_member().unwrap().type_reference(true).is_none());
    }

    #[test]
    fn test_verbatim_member_name() {
        let member = MemberExpression::new(None, "@class");
        assert_eq!(member.name(), "class");
        assert_eq!(member.raw_name(), "@class");
    }

    #[test]
    fn test_positional_arguments() {
        let arguments = positional_arguments([Expression::name("a"), Expression::name("b")]);
        assert_eq!(arguments.keys().collect::<Vec<_>>(), vec!["0", "1"]);
    }

    #[test]
    fn test_conversion_kind_notation() {
        assert_eq!(
            ConversionKind::from_notation("TypeAs"),
            Some(ConversionKind::TypeAs)
        );
        assert_eq!(ConversionKind::from_notation("Cast"), None);
    }
}
