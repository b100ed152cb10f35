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

//! Error code system for formula evaluation
//!
//! Every failure the engine reports carries one of these codes. Codes are grouped
//! by category and rendered as `FE0001`, `FE0002`, etc.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Structural errors (FE0001-FE0009)
    Execution,
    /// Member and argument binding errors (FE0010-FE0029)
    Binding,
    /// Collection access errors (FE0030-FE0039)
    Collection,
    /// Operator resolution errors (FE0040-FE0049)
    Operator,
    /// Type resolution and conversion errors (FE0050-FE0069)
    Type,
    /// Anything not classified
    Unknown,
}

/// Error code attached to every [`FormulaError`](crate::FormulaError)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Unknown,

    ExecExpressionIsInvalid,
    ExecNullReference,
    ExecUnsupportedExpression,

    BindMethodSignatureMismatch,
    BindUnsupportedObjectType,
    BindInvalidArraySize,
    BindStaticMemberNotFound,
    BindMemberNotFound,
    BindInvalidConditional,
    BindInvalidMapKey,
    BindMemberAccessFailed,

    CollKeyNotFound,
    CollIndexOutOfBounds,
    CollAddFailed,

    OpBinaryNotSupported,
    OpUnaryNotSupported,
    OpIndexerNotFound,

    TypeUnableToResolveGlobal,
    TypeAbstractInstantiation,
    TypeUnsupportedCollectionType,
    TypeInvalidArrayType,
    TypeUnresolved,
    TypeNoConversion,
    TypeNullConversionIllegal,
    TypeInvalidCast,
    TypeUnsolicitedStructType,
}

impl ErrorCode {
    /// Numeric value of the code
    pub const fn code(self) -> u16 {
        match self {
            ErrorCode::Unknown => 0,

            ErrorCode::ExecExpressionIsInvalid => 1,
            ErrorCode::ExecNullReference => 2,
            ErrorCode::ExecUnsupportedExpression => 3,

            ErrorCode::BindMethodSignatureMismatch => 10,
            ErrorCode::BindUnsupportedObjectType => 11,
            ErrorCode::BindInvalidArraySize => 12,
            ErrorCode::BindStaticMemberNotFound => 13,
            ErrorCode::BindMemberNotFound => 14,
            ErrorCode::BindInvalidConditional => 15,
            ErrorCode::BindInvalidMapKey => 16,
            ErrorCode::BindMemberAccessFailed => 17,

            ErrorCode::CollKeyNotFound => 30,
            ErrorCode::CollIndexOutOfBounds => 31,
            ErrorCode::CollAddFailed => 32,

            ErrorCode::OpBinaryNotSupported => 40,
            ErrorCode::OpUnaryNotSupported => 41,
            ErrorCode::OpIndexerNotFound => 42,

            ErrorCode::TypeUnableToResolveGlobal => 50,
            ErrorCode::TypeAbstractInstantiation => 51,
            ErrorCode::TypeUnsupportedCollectionType => 52,
            ErrorCode::TypeInvalidArrayType => 53,
            ErrorCode::TypeUnresolved => 54,
            ErrorCode::TypeNoConversion => 55,
            ErrorCode::TypeNullConversionIllegal => 56,
            ErrorCode::TypeInvalidCast => 57,
            ErrorCode::TypeUnsolicitedStructType => 58,
        }
    }

    /// Get error category for this error code
    pub const fn category(self) -> ErrorCategory {
        match self.code() {
            1..=9 => ErrorCategory::Execution,
            10..=29 => ErrorCategory::Binding,
            30..=39 => ErrorCategory::Collection,
            40..=49 => ErrorCategory::Operator,
            50..=69 => ErrorCategory::Type,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Symbolic name, e.g. `Exec_NullReference`
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown",
            ErrorCode::ExecExpressionIsInvalid => "Exec_ExpressionIsInvalid",
            ErrorCode::ExecNullReference => "Exec_NullReference",
            ErrorCode::ExecUnsupportedExpression => "Exec_UnsupportedExpression",
            ErrorCode::BindMethodSignatureMismatch => "Bind_MethodSignatureMismatch",
            ErrorCode::BindUnsupportedObjectType => "Bind_UnsupportedObjectType",
            ErrorCode::BindInvalidArraySize => "Bind_InvalidArraySize",
            ErrorCode::BindStaticMemberNotFound => "Bind_StaticMemberNotFound",
            ErrorCode::BindMemberNotFound => "Bind_MemberNotFound",
            ErrorCode::BindInvalidConditional => "Bind_InvalidConditional",
            ErrorCode::BindInvalidMapKey => "Bind_InvalidMapKey",
            ErrorCode::BindMemberAccessFailed => "Bind_MemberAccessFailed",
            ErrorCode::CollKeyNotFound => "Coll_KeyNotFound",
            ErrorCode::CollIndexOutOfBounds => "Coll_IndexOutOfBounds",
            ErrorCode::CollAddFailed => "Coll_AddFailed",
            ErrorCode::OpBinaryNotSupported => "Op_BinaryNotSupported",
            ErrorCode::OpUnaryNotSupported => "Op_UnaryNotSupported",
            ErrorCode::OpIndexerNotFound => "Op_IndexerNotFound",
            ErrorCode::TypeUnableToResolveGlobal => "Type_UnableToResolveGlobal",
            ErrorCode::TypeAbstractInstantiation => "Type_AbstractInstantiation",
            ErrorCode::TypeUnsupportedCollectionType => "Type_UnsupportedCollectionType",
            ErrorCode::TypeInvalidArrayType => "Type_InvalidArrayType",
            ErrorCode::TypeUnresolved => "Type_Unresolved",
            ErrorCode::TypeNoConversion => "Type_NoConversion",
            ErrorCode::TypeNullConversionIllegal => "Type_NullConversionIllegal",
            ErrorCode::TypeInvalidCast => "Type_InvalidCast",
            ErrorCode::TypeUnsolicitedStructType => "Type_UnsolicitedStructType",
        }
    }

    /// Get the full error code string (e.g., "FE0002")
    pub fn code_str(self) -> String {
        format!("FE{:04}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FE{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_rendering() {
        assert_eq!(ErrorCode::ExecNullReference.to_string(), "FE0002");
        assert_eq!(ErrorCode::TypeUnsolicitedStructType.code_str(), "FE0058");
        assert_eq!(ErrorCode::CollAddFailed.name(), "Coll_AddFailed");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Unknown);
        assert_eq!(ErrorCode::ExecUnsupportedExpression.category(), ErrorCategory::Execution);
        assert_eq!(ErrorCode::BindMemberAccessFailed.category(), ErrorCategory::Binding);
        assert_eq!(ErrorCode::CollKeyNotFound.category(), ErrorCategory::Collection);
        assert_eq!(ErrorCode::OpIndexerNotFound.category(), ErrorCategory::Operator);
        assert_eq!(ErrorCode::TypeInvalidCast.category(), ErrorCategory::Type);
    }
}
