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

//! Binary and unary operation kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operation kinds, named as they appear in the wire notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperation {
    And,
    Or,
    ExclusiveOr,
    Multiply,
    MultiplyChecked,
    Divide,
    DivideChecked,
    Power,
    Modulo,
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    LeftShift,
    RightShift,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    AndAlso,
    OrElse,
    Coalesce,
}

impl BinaryOperation {
    pub const ALL: [BinaryOperation; 24] = [
        BinaryOperation::And,
        BinaryOperation::Or,
        BinaryOperation::ExclusiveOr,
        BinaryOperation::Multiply,
        BinaryOperation::MultiplyChecked,
        BinaryOperation::Divide,
        BinaryOperation::DivideChecked,
        BinaryOperation::Power,
        BinaryOperation::Modulo,
        BinaryOperation::Add,
        BinaryOperation::AddChecked,
        BinaryOperation::Subtract,
        BinaryOperation::SubtractChecked,
        BinaryOperation::LeftShift,
        BinaryOperation::RightShift,
        BinaryOperation::GreaterThan,
        BinaryOperation::GreaterThanOrEqual,
        BinaryOperation::LessThan,
        BinaryOperation::LessThanOrEqual,
        BinaryOperation::Equal,
        BinaryOperation::NotEqual,
        BinaryOperation::AndAlso,
        BinaryOperation::OrElse,
        BinaryOperation::Coalesce,
    ];

    /// Source-level operator symbol used in messages and rendering
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOperation::And => "&",
            BinaryOperation::Or => "|",
            BinaryOperation::ExclusiveOr => "^",
            BinaryOperation::Multiply | BinaryOperation::MultiplyChecked => "*",
            BinaryOperation::Divide | BinaryOperation::DivideChecked => "/",
            BinaryOperation::Power => "**",
            BinaryOperation::Modulo => "%",
            BinaryOperation::Add | BinaryOperation::AddChecked => "+",
            BinaryOperation::Subtract | BinaryOperation::SubtractChecked => "-",
            BinaryOperation::LeftShift => "<<",
            BinaryOperation::RightShift => ">>",
            BinaryOperation::GreaterThan => ">",
            BinaryOperation::GreaterThanOrEqual => ">=",
            BinaryOperation::LessThan => "<",
            BinaryOperation::LessThanOrEqual => "<=",
            BinaryOperation::Equal => "==",
            BinaryOperation::NotEqual => "!=",
            BinaryOperation::AndAlso => "&&",
            BinaryOperation::OrElse => "||",
            BinaryOperation::Coalesce => "??",
        }
    }

    /// Name of the operation in the wire notation
    pub const fn notation_name(self) -> &'static str {
        match self {
            BinaryOperation::And => "And",
            BinaryOperation::Or => "Or",
            BinaryOperation::ExclusiveOr => "ExclusiveOr",
            BinaryOperation::Multiply => "Multiply",
            BinaryOperation::MultiplyChecked => "MultiplyChecked",
            BinaryOperation::Divide => "Divide",
            BinaryOperation::DivideChecked => "DivideChecked",
            BinaryOperation::Power => "Power",
            BinaryOperation::Modulo => "Modulo",
            BinaryOperation::Add => "Add",
            BinaryOperation::AddChecked => "AddChecked",
            BinaryOperation::Subtract => "Subtract",
            BinaryOperation::SubtractChecked => "SubtractChecked",
            BinaryOperation::LeftShift => "LeftShift",
            BinaryOperation::RightShift => "RightShift",
            BinaryOperation::GreaterThan => "GreaterThan",
            BinaryOperation::GreaterThanOrEqual => "GreaterThanOrEqual",
            BinaryOperation::LessThan => "LessThan",
            BinaryOperation::LessThanOrEqual => "LessThanOrEqual",
            BinaryOperation::Equal => "Equal",
            BinaryOperation::NotEqual => "NotEqual",
            BinaryOperation::AndAlso => "AndAlso",
            BinaryOperation::OrElse => "OrElse",
            BinaryOperation::Coalesce => "Coalesce",
        }
    }

    pub fn from_notation(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.notation_name() == name)
    }

    /// Whether integer overflow must be reported instead of wrapping
    pub const fn is_checked(self) -> bool {
        matches!(
            self,
            BinaryOperation::AddChecked
                | BinaryOperation::SubtractChecked
                | BinaryOperation::MultiplyChecked
                | BinaryOperation::DivideChecked
        )
    }

    /// The wrapping counterpart of a checked kind
    pub const fn unchecked(self) -> Self {
        match self {
            BinaryOperation::AddChecked => BinaryOperation::Add,
            BinaryOperation::SubtractChecked => BinaryOperation::Subtract,
            BinaryOperation::MultiplyChecked => BinaryOperation::Multiply,
            BinaryOperation::DivideChecked => BinaryOperation::Divide,
            other => other,
        }
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self.unchecked(),
            BinaryOperation::Add
                | BinaryOperation::Subtract
                | BinaryOperation::Multiply
                | BinaryOperation::Divide
                | BinaryOperation::Modulo
                | BinaryOperation::Power
        )
    }

    pub const fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperation::And | BinaryOperation::Or | BinaryOperation::ExclusiveOr
        )
    }

    pub const fn is_shift(self) -> bool {
        matches!(self, BinaryOperation::LeftShift | BinaryOperation::RightShift)
    }

    /// `>`, `>=`, `<`, `<=`
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOperation::GreaterThan
                | BinaryOperation::GreaterThanOrEqual
                | BinaryOperation::LessThan
                | BinaryOperation::LessThanOrEqual
        )
    }

    pub const fn is_equality(self) -> bool {
        matches!(self, BinaryOperation::Equal | BinaryOperation::NotEqual)
    }

    /// Conventional static function name of a custom overload
    pub const fn operator_function_name(self) -> Option<&'static str> {
        match self.unchecked() {
            BinaryOperation::Add => Some("op_Addition"),
            BinaryOperation::Subtract => Some("op_Subtraction"),
            BinaryOperation::Multiply => Some("op_Multiply"),
            BinaryOperation::Divide => Some("op_Division"),
            BinaryOperation::Modulo => Some("op_Modulus"),
            BinaryOperation::ExclusiveOr => Some("op_ExclusiveOr"),
            BinaryOperation::And => Some("op_BitwiseAnd"),
            BinaryOperation::Or => Some("op_BitwiseOr"),
            BinaryOperation::LeftShift => Some("op_LeftShift"),
            BinaryOperation::RightShift => Some("op_RightShift"),
            BinaryOperation::Equal => Some("op_Equality"),
            BinaryOperation::NotEqual => Some("op_Inequality"),
            BinaryOperation::GreaterThan => Some("op_GreaterThan"),
            BinaryOperation::GreaterThanOrEqual => Some("op_GreaterThanOrEqual"),
            BinaryOperation::LessThan => Some("op_LessThan"),
            BinaryOperation::LessThanOrEqual => Some("op_LessThanOrEqual"),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperation {
    UnaryPlus,
    Negate,
    NegateChecked,
    Not,
    Complement,
    Group,
    CheckedScope,
    UncheckedScope,
}

impl UnaryOperation {
    pub const ALL: [UnaryOperation; 8] = [
        UnaryOperation::UnaryPlus,
        UnaryOperation::Negate,
        UnaryOperation::NegateChecked,
        UnaryOperation::Not,
        UnaryOperation::Complement,
        UnaryOperation::Group,
        UnaryOperation::CheckedScope,
        UnaryOperation::UncheckedScope,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOperation::UnaryPlus => "+",
            UnaryOperation::Negate | UnaryOperation::NegateChecked => "-",
            UnaryOperation::Not => "!",
            UnaryOperation::Complement => "~",
            UnaryOperation::Group => "()",
            UnaryOperation::CheckedScope => "checked",
            UnaryOperation::UncheckedScope => "unchecked",
        }
    }

    pub const fn notation_name(self) -> &'static str {
        match self {
            UnaryOperation::UnaryPlus => "UnaryPlus",
            UnaryOperation::Negate => "Negate",
            UnaryOperation::NegateChecked => "NegateChecked",
            UnaryOperation::Not => "Not",
            UnaryOperation::Complement => "Complement",
            UnaryOperation::Group => "Group",
            UnaryOperation::CheckedScope => "CheckedScope",
            UnaryOperation::UncheckedScope => "UncheckedScope",
        }
    }

    pub fn from_notation(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.notation_name() == name)
    }

    /// Grouping and scope markers pass their operand through unchanged
    pub const fn is_passthrough(self) -> bool {
        matches!(
            self,
            UnaryOperation::Group | UnaryOperation::CheckedScope | UnaryOperation::UncheckedScope
        )
    }

    pub const fn operator_function_name(self) -> Option<&'static str> {
        match self {
            UnaryOperation::UnaryPlus => Some("op_UnaryPlus"),
            UnaryOperation::Negate | UnaryOperation::NegateChecked => Some("op_UnaryNegation"),
            UnaryOperation::Not => Some("op_LogicalNot"),
            UnaryOperation::Complement => Some("op_OnesComplement"),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Static function names of custom conversion operators, tried in order
pub const CONVERSION_FUNCTION_NAMES: [&str; 2] = ["op_Implicit", "op_Explicit"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_names_round_trip() {
        for op in BinaryOperation::ALL {
            assert_eq!(BinaryOperation::from_notation(op.notation_name()), Some(op));
        }
        for op in UnaryOperation::ALL {
            assert_eq!(UnaryOperation::from_notation(op.notation_name()), Some(op));
        }
        assert_eq!(BinaryOperation::from_notation("Negate"), None);
    }

    #[test]
    fn test_checked_kinds() {
        assert!(BinaryOperation::AddChecked.is_checked());
        assert_eq!(BinaryOperation::MultiplyChecked.unchecked(), BinaryOperation::Multiply);
        assert_eq!(BinaryOperation::AddChecked.symbol(), "+");
        assert_eq!(
            BinaryOperation::SubtractChecked.operator_function_name(),
            Some("op_Subtraction")
        );
        assert_eq!(BinaryOperation::Coalesce.operator_function_name(), None);
    }
}
