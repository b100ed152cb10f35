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

//! Core error type with rich error code system

use thiserror::Error;

pub use super::error_code::*;

/// Main formula error type
///
/// Every variant carries an [`ErrorCode`] and a fully rendered message. The
/// variant only groups errors by category; matching on [`FormulaError::code`]
/// is the stable way to inspect a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Invalid tree, unsupported node, null reference
    #[error("{error_code}: {message}")]
    Execution { error_code: ErrorCode, message: String },

    /// Member lookup and argument binding
    #[error("{error_code}: {message}")]
    Binding { error_code: ErrorCode, message: String },

    /// Container access
    #[error("{error_code}: {message}")]
    Collection { error_code: ErrorCode, message: String },

    /// Operator resolution
    #[error("{error_code}: {message}")]
    Operator { error_code: ErrorCode, message: String },

    /// Type resolution and conversion
    #[error("{error_code}: {message}")]
    Type { error_code: ErrorCode, message: String },
}

/// Result type alias for formula operations
pub type Result<T> = std::result::Result<T, FormulaError>;

impl FormulaError {
    /// Build an error from a code and a message, picking the variant from the code's category
    pub fn new(error_code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match error_code.category() {
            ErrorCategory::Binding => Self::Binding { error_code, message },
            ErrorCategory::Collection => Self::Collection { error_code, message },
            ErrorCategory::Operator => Self::Operator { error_code, message },
            ErrorCategory::Type => Self::Type { error_code, message },
            ErrorCategory::Execution | ErrorCategory::Unknown => {
                Self::Execution { error_code, message }
            }
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Execution { error_code, .. }
            | Self::Binding { error_code, .. }
            | Self::Collection { error_code, .. }
            | Self::Operator { error_code, .. }
            | Self::Type { error_code, .. } => *error_code,
        }
    }

    /// Get the rendered message, without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Execution { message, .. }
            | Self::Binding { message, .. }
            | Self::Collection { message, .. }
            | Self::Operator { message, .. }
            | Self::Type { message, .. } => message,
        }
    }

    // Execution

    pub fn expression_is_invalid() -> Self {
        Self::new(
            ErrorCode::ExecExpressionIsInvalid,
            "Expression is in an invalid or uninitialized state.",
        )
    }

    /// Invalid tree with extra detail, e.g. a missing attribute in the wire format
    pub fn invalid_expression(detail: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::ExecExpressionIsInvalid,
            format!(
                "Expression is in an invalid or uninitialized state. {}",
                detail.as_ref()
            ),
        )
    }

    pub fn null_reference() -> Self {
        Self::new(
            ErrorCode::ExecNullReference,
            "Attempted to access a null object reference.",
        )
    }

    pub fn unsupported_expression(expression_type: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::ExecUnsupportedExpression,
            format!(
                "Expression type '{}' is not supported.",
                expression_type.as_ref()
            ),
        )
    }

    // Binding

    /// `argument_types` is empty when the call had no arguments
    pub fn method_signature_mismatch(
        type_name: impl AsRef<str>,
        method_name: impl AsRef<str>,
        argument_types: &[String],
    ) -> Self {
        let message = if argument_types.is_empty() {
            format!(
                "Cannot bind method '{}' on type '{}' with no arguments.",
                method_name.as_ref(),
                type_name.as_ref()
            )
        } else {
            format!(
                "Cannot bind method '{}' on type '{}' with ({}) arguments.",
                method_name.as_ref(),
                type_name.as_ref(),
                argument_types.join(", ")
            )
        };
        Self::new(ErrorCode::BindMethodSignatureMismatch, message)
    }

    pub fn unsupported_object_type(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::BindUnsupportedObjectType,
            format!(
                "Type '{}' cannot be constructed. Only reflection-visible classes and primitives are supported.",
                type_name.as_ref()
            ),
        )
    }

    pub fn invalid_array_size(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::BindInvalidArraySize,
            format!(
                "Invalid collection size type '{}'. Expected an integer value.",
                type_name.as_ref()
            ),
        )
    }

    pub fn array_size_exceeds_limit(size: usize, limit: usize) -> Self {
        Self::new(
            ErrorCode::BindInvalidArraySize,
            format!("Array size {size} exceeds the limit of {limit} elements."),
        )
    }

    pub fn static_member_not_found(
        type_name: impl AsRef<str>,
        member_name: impl AsRef<str>,
        available: &[String],
    ) -> Self {
        Self::new(
            ErrorCode::BindStaticMemberNotFound,
            format!(
                "Cannot find static member '{}' on type '{}'. Available static members: {}.",
                member_name.as_ref(),
                type_name.as_ref(),
                available.join(", ")
            ),
        )
    }

    pub fn member_not_found(
        type_name: impl AsRef<str>,
        member_name: impl AsRef<str>,
        available: &[String],
    ) -> Self {
        Self::new(
            ErrorCode::BindMemberNotFound,
            format!(
                "Cannot find member '{}' on type '{}'. Available members: {}.",
                member_name.as_ref(),
                type_name.as_ref(),
                available.join(", ")
            ),
        )
    }

    pub fn invalid_conditional(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::BindInvalidConditional,
            format!(
                "Conditional expression result cannot be of type '{}'. Boolean or compatible type expected.",
                type_name.as_ref()
            ),
        )
    }

    pub fn invalid_map_key(
        key: impl AsRef<str>,
        key_type: impl AsRef<str>,
        expected_type: impl AsRef<str>,
    ) -> Self {
        Self::new(
            ErrorCode::BindInvalidMapKey,
            format!(
                "Invalid map key '{}' of type '{}'. Expected key type: '{}'.",
                key.as_ref(),
                key_type.as_ref(),
                expected_type.as_ref()
            ),
        )
    }

    pub fn member_access_failed(type_name: impl AsRef<str>, member_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::BindMemberAccessFailed,
            format!(
                "Failed to access member '{}' on type '{}'.",
                member_name.as_ref(),
                type_name.as_ref()
            ),
        )
    }

    /// Host call failure; the host's own message follows the member name
    pub fn member_call_failed(
        type_name: impl AsRef<str>,
        member_name: impl AsRef<str>,
        reason: impl AsRef<str>,
    ) -> Self {
        Self::new(
            ErrorCode::BindMemberAccessFailed,
            format!(
                "Failed to access member '{}' on type '{}': {}",
                member_name.as_ref(),
                type_name.as_ref(),
                reason.as_ref()
            ),
        )
    }

    // Collection

    pub fn key_not_found(key: impl AsRef<str>, key_type: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::CollKeyNotFound,
            format!(
                "Key '{}' (Type: {}) not found in map.",
                key.as_ref(),
                key_type.as_ref()
            ),
        )
    }

    pub fn index_out_of_bounds(index: i64, size: usize) -> Self {
        Self::new(
            ErrorCode::CollIndexOutOfBounds,
            format!("Index {index} is out of bounds for collection of size {size}."),
        )
    }

    pub fn add_failed(collection_type: impl AsRef<str>, value_types: &[String]) -> Self {
        Self::new(
            ErrorCode::CollAddFailed,
            format!(
                "Failed to add ({}) tuple to '{}' collection.",
                value_types.join(", "),
                collection_type.as_ref()
            ),
        )
    }

    // Operator

    pub fn binary_not_supported(
        symbol: impl AsRef<str>,
        left_type: impl AsRef<str>,
        right_type: impl AsRef<str>,
    ) -> Self {
        Self::new(
            ErrorCode::OpBinaryNotSupported,
            format!(
                "Binary operator '{}' is not defined between types '{}' and '{}'.",
                symbol.as_ref(),
                left_type.as_ref(),
                right_type.as_ref()
            ),
        )
    }

    pub fn unary_not_supported(symbol: impl AsRef<str>, operand_type: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::OpUnaryNotSupported,
            format!(
                "Unary operator '{}' is not defined for type '{}'.",
                symbol.as_ref(),
                operand_type.as_ref()
            ),
        )
    }

    pub fn indexer_not_found(type_name: impl AsRef<str>, argument_types: &[String]) -> Self {
        Self::new(
            ErrorCode::OpIndexerNotFound,
            format!(
                "Type '{}' does not define an indexer accepting arguments: ({}).",
                type_name.as_ref(),
                argument_types.join(", ")
            ),
        )
    }

    // Type

    pub fn unable_to_resolve_global(name: impl AsRef<str>, available: &[String]) -> Self {
        Self::new(
            ErrorCode::TypeUnableToResolveGlobal,
            format!(
                "Cannot resolve global member or argument '{}'. Available globals: {}.",
                name.as_ref(),
                available.join(", ")
            ),
        )
    }

    pub fn abstract_instantiation(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeAbstractInstantiation,
            format!("Cannot instantiate abstract class '{}'.", type_name.as_ref()),
        )
    }

    pub fn unsupported_collection_type(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeUnsupportedCollectionType,
            format!(
                "Collection type '{}' is unsupported. Only object-derived types and basic structures are allowed.",
                type_name.as_ref()
            ),
        )
    }

    pub fn invalid_array_type(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeInvalidArrayType,
            format!(
                "Invalid array declaration '{}'. Arrays must be 'Array' with exactly one element type argument.",
                type_name.as_ref()
            ),
        )
    }

    pub fn unresolved_type(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeUnresolved,
            format!(
                "Failed to resolve type '{}'. Ensure the type is registered in the known types list.",
                type_name.as_ref()
            ),
        )
    }

    pub fn no_conversion(from_type: impl AsRef<str>, to_type: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeNoConversion,
            format!(
                "No conversion exists from type '{}' to '{}'.",
                from_type.as_ref(),
                to_type.as_ref()
            ),
        )
    }

    pub fn null_conversion_illegal(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeNullConversionIllegal,
            format!("Cannot convert null to type '{}'.", type_name.as_ref()),
        )
    }

    pub fn invalid_cast(from_type: impl AsRef<str>, to_type: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeInvalidCast,
            format!(
                "Cannot cast object of type '{}' to '{}'.",
                from_type.as_ref(),
                to_type.as_ref()
            ),
        )
    }

    pub fn unsolicited_struct_type(type_name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::TypeUnsolicitedStructType,
            format!(
                "Cannot create a struct of type '{}' because it lacks a compatible destination. \
                 Structs can only be created when assigned to a typed member or argument.",
                type_name.as_ref()
            ),
        )
    }
}
