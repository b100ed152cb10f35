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

//! Dynamic runtime values
//!
//! [`Value`] is the interpreter's datum: a closed tagged union over the
//! primitive type codes, object references, enum values and struct-like values
//! (records, containers and types used as values).

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use formula_engine_core::TypeCode;
use indexmap::IndexMap;

use crate::coercion::{format_datetime, format_timespan};
use crate::reflection::{ClassRef, HostEnum, ObjectRef, ReflectedType};
use crate::types::TypeDescriptorRef;

/// Runtime value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Timespan(TimeDelta),
    DateTime(NaiveDateTime),
    String(Arc<str>),
    /// Interned identifier
    Name(Arc<str>),
    /// Display text
    Text(Arc<str>),
    /// Non-null object reference
    Object(ObjectRef),
    Enum(EnumValue),
    Struct(StructValue),
}

/// Value of a reflected enum, stored as a wide integer
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub ty: Arc<HostEnum>,
    pub value: i64,
}

impl EnumValue {
    pub fn new(ty: Arc<HostEnum>, value: i64) -> Self {
        Self { ty, value }
    }

    /// The value as its declared underlying integer type
    pub fn to_underlying(&self) -> Value {
        Value::integral(self.ty.underlying(), i128::from(self.value))
            .unwrap_or(Value::Int64(self.value))
    }
}

/// Value-typed composites
#[derive(Clone)]
pub enum StructValue {
    /// Instance of a reflected struct
    Record {
        class: ClassRef,
        fields: IndexMap<String, Value>,
    },
    Array {
        element: ReflectedType,
        items: Vec<Value>,
    },
    Set {
        element: ReflectedType,
        items: Vec<Value>,
    },
    Map {
        key: ReflectedType,
        value: ReflectedType,
        entries: Vec<(Value, Value)>,
    },
    /// A type used as a value
    Type(TypeDescriptorRef),
}

impl Value {
    pub fn string(value: impl AsRef<str>) -> Self {
        Value::String(Arc::from(value.as_ref()))
    }

    pub fn name(value: impl AsRef<str>) -> Self {
        Value::Name(Arc::from(value.as_ref()))
    }

    pub fn text(value: impl AsRef<str>) -> Self {
        Value::Text(Arc::from(value.as_ref()))
    }

    /// Object reference; a missing object collapses to `Null`
    pub fn object(object: Option<ObjectRef>) -> Self {
        match object {
            Some(object) => Value::Object(object),
            None => Value::Null,
        }
    }

    pub fn type_value(descriptor: TypeDescriptorRef) -> Self {
        Value::Struct(StructValue::Type(descriptor))
    }

    /// Integral value of the given code, `None` when `value` does not fit
    pub fn integral(code: TypeCode, value: i128) -> Option<Self> {
        Some(match code {
            TypeCode::UInt8 => Value::UInt8(u8::try_from(value).ok()?),
            TypeCode::UInt16 => Value::UInt16(u16::try_from(value).ok()?),
            TypeCode::UInt32 => Value::UInt32(u32::try_from(value).ok()?),
            TypeCode::UInt64 => Value::UInt64(u64::try_from(value).ok()?),
            TypeCode::Int8 => Value::Int8(i8::try_from(value).ok()?),
            TypeCode::Int16 => Value::Int16(i16::try_from(value).ok()?),
            TypeCode::Int32 => Value::Int32(i32::try_from(value).ok()?),
            TypeCode::Int64 => Value::Int64(i64::try_from(value).ok()?),
            _ => return None,
        })
    }

    /// Integral value of the given code, truncating like an `as` cast
    pub fn integral_wrapping(code: TypeCode, value: i128) -> Option<Self> {
        Some(match code {
            TypeCode::UInt8 => Value::UInt8(value as u8),
            TypeCode::UInt16 => Value::UInt16(value as u16),
            TypeCode::UInt32 => Value::UInt32(value as u32),
            TypeCode::UInt64 => Value::UInt64(value as u64),
            TypeCode::Int8 => Value::Int8(value as i8),
            TypeCode::Int16 => Value::Int16(value as i16),
            TypeCode::Int32 => Value::Int32(value as i32),
            TypeCode::Int64 => Value::Int64(value as i64),
            _ => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Null => TypeCode::Null,
            Value::Boolean(_) => TypeCode::Boolean,
            Value::UInt8(_) => TypeCode::UInt8,
            Value::UInt16(_) => TypeCode::UInt16,
            Value::UInt32(_) => TypeCode::UInt32,
            Value::UInt64(_) => TypeCode::UInt64,
            Value::Int8(_) => TypeCode::Int8,
            Value::Int16(_) => TypeCode::Int16,
            Value::Int32(_) => TypeCode::Int32,
            Value::Int64(_) => TypeCode::Int64,
            Value::Float(_) => TypeCode::Float,
            Value::Double(_) => TypeCode::Double,
            Value::Timespan(_) => TypeCode::Timespan,
            Value::DateTime(_) => TypeCode::DateTime,
            Value::String(_) => TypeCode::String,
            Value::Name(_) => TypeCode::Name,
            Value::Text(_) => TypeCode::Text,
            Value::Object(_) => TypeCode::ObjectPtr,
            Value::Enum(_) => TypeCode::Enum,
            Value::Struct(_) => TypeCode::Struct,
        }
    }

    /// Structural type of the value. Objects report their runtime class.
    pub fn reflected_type(&self) -> ReflectedType {
        match self {
            Value::Object(object) => ReflectedType::Object(object.class()),
            Value::Enum(value) => ReflectedType::Enum(value.ty.clone()),
            Value::Struct(StructValue::Record { class, .. }) => ReflectedType::Struct(class.clone()),
            Value::Struct(StructValue::Array { element, .. }) => {
                ReflectedType::array(element.clone())
            }
            Value::Struct(StructValue::Set { element, .. }) => ReflectedType::set(element.clone()),
            Value::Struct(StructValue::Map { key, value, .. }) => {
                ReflectedType::map(key.clone(), value.clone())
            }
            Value::Struct(StructValue::Type(_)) => ReflectedType::TypeObject,
            other => ReflectedType::Primitive(other.type_code()),
        }
    }

    /// Reflection-side type name of the value, used in diagnostics
    pub fn type_name(&self) -> String {
        self.reflected_type().cpp_type()
    }

    /// The value with enums replaced by their underlying integer
    pub fn visit(&self) -> Value {
        match self {
            Value::Enum(value) => value.to_underlying(),
            other => other.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Integral payload, enums included
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::UInt8(v) => i128::from(*v),
            Value::UInt16(v) => i128::from(*v),
            Value::UInt32(v) => i128::from(*v),
            Value::UInt64(v) => i128::from(*v),
            Value::Int8(v) => i128::from(*v),
            Value::Int16(v) => i128::from(*v),
            Value::Int32(v) => i128::from(*v),
            Value::Int64(v) => i128::from(*v),
            Value::Enum(v) => i128::from(v.value),
            _ => return None,
        })
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Any numeric payload widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Payload of the string family
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Name(s) | Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeDescriptorRef> {
        match self {
            Value::Struct(StructValue::Type(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// Identity comparison for objects
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::UInt8(a), Value::UInt8(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Timespan(a), Value::Timespan(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::String(a), Value::String(b))
            | (Value::Name(a), Value::Name(b))
            | (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Object(_), Value::Object(_)) => self.same_object(other),
            (Value::Enum(a), Value::Enum(b)) => a.ty.cpp_name() == b.ty.cpp_name() && a.value == b.value,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                StructValue::Record { class: a, fields: fa },
                StructValue::Record { class: b, fields: fb },
            ) => a.cpp_name() == b.cpp_name() && fa == fb,
            (
                StructValue::Array { element: ea, items: a },
                StructValue::Array { element: eb, items: b },
            )
            | (
                StructValue::Set { element: ea, items: a },
                StructValue::Set { element: eb, items: b },
            ) => ea == eb && a == b,
            (
                StructValue::Map { key: ka, value: va, entries: a },
                StructValue::Map { key: kb, value: vb, entries: b },
            ) => ka == kb && va == vb && a == b,
            (StructValue::Type(a), StructValue::Type(b)) => a.identity() == b.identity(),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Boolean(v) => write!(f, "Boolean({v})"),
            Value::UInt8(v) => write!(f, "UInt8({v})"),
            Value::UInt16(v) => write!(f, "UInt16({v})"),
            Value::UInt32(v) => write!(f, "UInt32({v})"),
            Value::UInt64(v) => write!(f, "UInt64({v})"),
            Value::Int8(v) => write!(f, "Int8({v})"),
            Value::Int16(v) => write!(f, "Int16({v})"),
            Value::Int32(v) => write!(f, "Int32({v})"),
            Value::Int64(v) => write!(f, "Int64({v})"),
            Value::Float(v) => write!(f, "Float({v:?})"),
            Value::Double(v) => write!(f, "Double({v:?})"),
            Value::Timespan(v) => write!(f, "Timespan({})", format_timespan(*v)),
            Value::DateTime(v) => write!(f, "DateTime({})", format_datetime(*v)),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Name(v) => write!(f, "Name({v:?})"),
            Value::Text(v) => write!(f, "Text({v:?})"),
            Value::Object(object) => write!(f, "Object({}*)", object.class().cpp_name()),
            Value::Enum(v) => write!(f, "Enum({}::{})", v.ty.cpp_name(), v.value),
            Value::Struct(v) => write!(f, "Struct({v:?})"),
        }
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructValue::Record { class, fields } => f
                .debug_struct("Record")
                .field("class", &class.cpp_name())
                .field("fields", fields)
                .finish(),
            StructValue::Array { element, items } => f
                .debug_struct("Array")
                .field("element", &element.cpp_type())
                .field("items", items)
                .finish(),
            StructValue::Set { element, items } => f
                .debug_struct("Set")
                .field("element", &element.cpp_type())
                .field("items", items)
                .finish(),
            StructValue::Map { key, value, entries } => f
                .debug_struct("Map")
                .field("key", &key.cpp_type())
                .field("value", &value.cpp_type())
                .field("entries", entries)
                .finish(),
            StructValue::Type(descriptor) => write!(f, "Type({})", descriptor.type_name()),
        }
    }
}

fn write_list<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    close: &str,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Timespan(v) => f.write_str(&format_timespan(*v)),
            Value::DateTime(v) => f.write_str(&format_datetime(*v)),
            Value::String(v) | Value::Name(v) | Value::Text(v) => f.write_str(v),
            Value::Object(object) => write!(f, "{}*", object.class().cpp_name()),
            Value::Enum(v) => match v.ty.literal_name(v.value) {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", v.value),
            },
            Value::Struct(StructValue::Record { class, fields }) => {
                write!(f, "{} {{", class.cpp_name())?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                f.write_str(" }")
            }
            Value::Struct(StructValue::Array { items, .. }) => write_list(f, "[", "]", items.iter()),
            Value::Struct(StructValue::Set { items, .. }) => write_list(f, "{", "}", items.iter()),
            Value::Struct(StructValue::Map { entries, .. }) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Struct(StructValue::Type(descriptor)) => f.write_str(descriptor.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}
