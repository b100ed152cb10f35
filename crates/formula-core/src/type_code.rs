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

//! Primitive type codes
//!
//! A [`TypeCode`] is the coarse runtime tag of a value: which primitive it is, or
//! whether it is an object reference, a struct or an enum. Descriptors refine the
//! struct/object/enum cases with a concrete class.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum TypeCode {
    #[default]
    Null,
    Boolean,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Timespan,
    DateTime,
    String,
    Name,
    Text,
    ObjectPtr,
    Struct,
    Enum,
}

impl TypeCode {
    pub const INTEGRALS: [TypeCode; 8] = [
        TypeCode::UInt8,
        TypeCode::UInt16,
        TypeCode::UInt32,
        TypeCode::UInt64,
        TypeCode::Int8,
        TypeCode::Int16,
        TypeCode::Int32,
        TypeCode::Int64,
    ];

    /// Every code that has a primitive descriptor
    pub const PRIMITIVES: [TypeCode; 16] = [
        TypeCode::Boolean,
        TypeCode::UInt8,
        TypeCode::UInt16,
        TypeCode::UInt32,
        TypeCode::UInt64,
        TypeCode::Int8,
        TypeCode::Int16,
        TypeCode::Int32,
        TypeCode::Int64,
        TypeCode::Float,
        TypeCode::Double,
        TypeCode::Timespan,
        TypeCode::DateTime,
        TypeCode::String,
        TypeCode::Name,
        TypeCode::Text,
    ];

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            TypeCode::UInt8
                | TypeCode::UInt16
                | TypeCode::UInt32
                | TypeCode::UInt64
                | TypeCode::Int8
                | TypeCode::Int16
                | TypeCode::Int32
                | TypeCode::Int64
        )
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            TypeCode::Int8 | TypeCode::Int16 | TypeCode::Int32 | TypeCode::Int64
        )
    }

    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            TypeCode::UInt8 | TypeCode::UInt16 | TypeCode::UInt32 | TypeCode::UInt64
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, TypeCode::Float | TypeCode::Double)
    }

    pub const fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// String, Name and Text
    pub const fn is_string_family(self) -> bool {
        matches!(self, TypeCode::String | TypeCode::Name | TypeCode::Text)
    }

    /// Codes that take part in direct value coercion (explicit conversions)
    pub const fn is_coercible(self) -> bool {
        !matches!(
            self,
            TypeCode::Null
                | TypeCode::ObjectPtr
                | TypeCode::Struct
                | TypeCode::DateTime
                | TypeCode::Timespan
        )
    }

    /// Width in bits of integral and floating codes, zero otherwise
    pub const fn bit_width(self) -> u32 {
        match self {
            TypeCode::UInt8 | TypeCode::Int8 => 8,
            TypeCode::UInt16 | TypeCode::Int16 => 16,
            TypeCode::UInt32 | TypeCode::Int32 | TypeCode::Float => 32,
            TypeCode::UInt64 | TypeCode::Int64 | TypeCode::Double => 64,
            _ => 0,
        }
    }

    /// Reflection-side spelling of the type (`int32`, `FString`, ...)
    pub const fn cpp_name(self) -> &'static str {
        match self {
            TypeCode::Null => "nullptr_t",
            TypeCode::Boolean => "bool",
            TypeCode::UInt8 => "uint8",
            TypeCode::UInt16 => "uint16",
            TypeCode::UInt32 => "uint32",
            TypeCode::UInt64 => "uint64",
            TypeCode::Int8 => "int8",
            TypeCode::Int16 => "int16",
            TypeCode::Int32 => "int32",
            TypeCode::Int64 => "int64",
            TypeCode::Float => "float",
            TypeCode::Double => "double",
            TypeCode::Timespan => "FTimespan",
            TypeCode::DateTime => "FDateTime",
            TypeCode::String => "FString",
            TypeCode::Name => "FName",
            TypeCode::Text => "FText",
            TypeCode::ObjectPtr => "UObject*",
            TypeCode::Struct => "struct",
            TypeCode::Enum => "enum",
        }
    }

    /// Whether a value tagged `source` may be stored where `self` is expected
    /// without an explicit conversion
    pub fn is_assignable_from(self, source: TypeCode) -> bool {
        use TypeCode::*;
        match self {
            Null => matches!(source, Null | ObjectPtr),
            Boolean => source == Boolean,
            UInt8 => source == UInt8,
            UInt16 => matches!(source, UInt8 | UInt16),
            UInt32 => matches!(source, UInt8 | UInt16 | UInt32),
            UInt64 => source.is_unsigned(),
            Int8 => source == Int8,
            Int16 => matches!(source, Int8 | UInt8 | Int16),
            Int32 => matches!(source, Int8 | UInt8 | Int16 | UInt16 | Int32),
            Int64 => source.is_integral() && source != UInt64,
            Float => source.is_integral() || source == Float,
            Double => source.is_numeric(),
            Timespan => source == Timespan,
            DateTime => source == DateTime,
            String | Name | Text => source.is_string_family() || source == Null,
            ObjectPtr => matches!(source, Null | ObjectPtr),
            Struct => source == Struct,
            Enum => source == Enum || source.is_unsigned(),
        }
    }

    /// Whether the null value can be stored in a slot of this code
    pub const fn can_be_null(self) -> bool {
        matches!(self, TypeCode::Null | TypeCode::ObjectPtr)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cpp_name())
    }
}
