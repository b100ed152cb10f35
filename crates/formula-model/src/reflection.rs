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

//! Host reflection collaborator
//!
//! The engine never touches host objects directly. Everything it knows about a
//! host type comes through the traits in this module: a [`HostClass`] enumerates
//! properties and functions, a [`HostProperty`] reads and writes a member, a
//! [`HostFunction`] is invoked with a positional argument buffer and a
//! [`HostObject`] reports its runtime (most-derived) class.
//!
//! [`ReflectedType`] is the structural description of a slot: a primitive, a
//! class or struct, an enum or one of the three container kinds.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use formula_engine_core::TypeCode;
use indexmap::IndexMap;

use crate::value::{EnumValue, StructValue, Value};

pub type ClassRef = Arc<dyn HostClass>;
pub type PropertyRef = Arc<dyn HostProperty>;
pub type FunctionRef = Arc<dyn HostFunction>;
pub type ObjectRef = Arc<dyn HostObject>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Reference type, handled through object pointers
    Class,
    /// Value type, copied on assignment
    Struct,
}

/// A reflected class or struct
pub trait HostClass: Send + Sync + fmt::Debug {
    /// Name without prefix, e.g. `TestObject`
    fn name(&self) -> &str;

    /// Reflection prefix: `U` for objects, `A` for actors, `F` for structs
    fn cpp_prefix(&self) -> &str;

    fn kind(&self) -> ClassKind;

    fn is_abstract(&self) -> bool {
        false
    }

    fn super_class(&self) -> Option<ClassRef> {
        None
    }

    /// Properties declared on this class, without inherited ones
    fn properties(&self) -> Vec<PropertyRef>;

    /// Functions declared on this class, without inherited ones
    fn functions(&self) -> Vec<FunctionRef>;

    /// Class default object, used for static member access
    fn default_instance(&self) -> Option<Value>;

    /// Create a fresh instance. `None` when the class cannot be constructed.
    fn construct(&self) -> Option<Value>;

    /// Prefixed name, e.g. `UTestObject`
    fn cpp_name(&self) -> String {
        format!("{}{}", self.cpp_prefix(), self.name())
    }
}

/// Whether `class` is `ancestor` or derives from it
pub fn is_child_of(class: &dyn HostClass, ancestor: &dyn HostClass) -> bool {
    if class.name() == ancestor.name() && class.kind() == ancestor.kind() {
        return true;
    }
    let mut current = class.super_class();
    while let Some(parent) = current {
        if parent.name() == ancestor.name() && parent.kind() == ancestor.kind() {
            return true;
        }
        current = parent.super_class();
    }
    false
}

/// Properties of `class` including inherited ones. Derived declarations shadow base ones.
pub fn all_properties(class: &dyn HostClass) -> Vec<PropertyRef> {
    let mut seen: IndexMap<String, PropertyRef> = IndexMap::new();
    for property in class.properties() {
        seen.entry(property.name().to_string()).or_insert(property);
    }
    let mut current = class.super_class();
    while let Some(parent) = current {
        for property in parent.properties() {
            seen.entry(property.name().to_string()).or_insert(property);
        }
        current = parent.super_class();
    }
    seen.into_values().collect()
}

/// Functions of `class` including inherited ones, derived first. Overloads are kept.
pub fn all_functions(class: &dyn HostClass) -> Vec<FunctionRef> {
    let mut functions = class.functions();
    let mut current = class.super_class();
    while let Some(parent) = current {
        functions.extend(parent.functions());
        current = parent.super_class();
    }
    functions
}

/// A reflected property
pub trait HostProperty: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn value_type(&self) -> ReflectedType;

    fn is_public(&self) -> bool {
        true
    }

    /// Read the property from `target`. `None` when the target does not carry it.
    fn get(&self, target: &Value) -> Option<Value>;

    /// Write the property on `target`. The value already has the property's type.
    fn set(&self, target: &mut Value, value: Value) -> bool;

    /// Initial value on a freshly constructed instance
    fn default_value(&self) -> Value {
        self.value_type().default_value()
    }
}

#[derive(Debug, Clone)]
pub struct HostParameter {
    pub name: String,
    pub ty: ReflectedType,
    pub is_out: bool,
}

impl HostParameter {
    pub fn new(name: impl Into<String>, ty: ReflectedType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_out: false,
        }
    }

    pub fn out(name: impl Into<String>, ty: ReflectedType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_out: true,
        }
    }
}

/// Arguments of a single host call
///
/// `arguments` follows the function's parameter order. Output parameters are
/// written back into the buffer by the callee.
pub struct HostCall<'a> {
    pub target: Option<&'a Value>,
    pub arguments: &'a mut [Value],
    pub type_arguments: &'a [ReflectedType],
}

impl HostCall<'_> {
    pub fn argument(&self, index: usize) -> std::result::Result<&Value, String> {
        self.arguments
            .get(index)
            .ok_or_else(|| format!("missing argument {index}"))
    }

    pub fn target(&self) -> std::result::Result<&Value, String> {
        match self.target {
            Some(target) if !target.is_null() => Ok(target),
            _ => Err("missing call target".to_string()),
        }
    }
}

/// A reflected function
pub trait HostFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn is_static(&self) -> bool;

    fn is_public(&self) -> bool {
        true
    }

    fn parameters(&self) -> &[HostParameter];

    /// `Primitive(Null)` for functions returning nothing
    fn return_type(&self) -> ReflectedType;

    /// Invoke the function. The error string is diagnostic only.
    fn invoke(&self, call: HostCall<'_>) -> std::result::Result<Value, String>;
}

/// A live host object
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Runtime, most-derived class of the object
    fn class(&self) -> ClassRef;

    fn as_any(&self) -> &dyn Any;
}

/// A reflected enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnum {
    name: String,
    prefix: String,
    underlying: TypeCode,
    literals: Vec<(String, i64)>,
}

impl HostEnum {
    pub fn new(name: impl Into<String>, underlying: TypeCode) -> Self {
        Self {
            name: name.into(),
            prefix: "E".to_string(),
            underlying,
            literals: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_literal(mut self, name: impl Into<String>, value: i64) -> Self {
        self.literals.push((name.into(), value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn cpp_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    /// Integer code enum values are stored as
    pub fn underlying(&self) -> TypeCode {
        self.underlying
    }

    pub fn literals(&self) -> &[(String, i64)] {
        &self.literals
    }

    pub fn literal_value(&self, name: &str) -> Option<i64> {
        self.literals
            .iter()
            .find(|(literal, _)| literal == name)
            .map(|(_, value)| *value)
    }

    pub fn literal_name(&self, value: i64) -> Option<&str> {
        self.literals
            .iter()
            .find(|(_, literal)| *literal == value)
            .map(|(name, _)| name.as_str())
    }
}

/// Stable key of a (possibly composite) type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity(Arc<str>);

impl TypeIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural description of a value slot
#[derive(Debug, Clone)]
pub enum ReflectedType {
    Primitive(TypeCode),
    Object(ClassRef),
    Struct(ClassRef),
    Enum(Arc<HostEnum>),
    Array(Box<ReflectedType>),
    Set(Box<ReflectedType>),
    Map(Box<ReflectedType>, Box<ReflectedType>),
    /// A type used as a value (`typeof` results)
    TypeObject,
}

impl ReflectedType {
    pub fn array(element: ReflectedType) -> Self {
        ReflectedType::Array(Box::new(element))
    }

    pub fn set(element: ReflectedType) -> Self {
        ReflectedType::Set(Box::new(element))
    }

    pub fn map(key: ReflectedType, value: ReflectedType) -> Self {
        ReflectedType::Map(Box::new(key), Box::new(value))
    }

    /// Slot type for a class: object pointer for classes, inline value for structs
    pub fn of_class(class: ClassRef) -> Self {
        match class.kind() {
            ClassKind::Class => ReflectedType::Object(class),
            ClassKind::Struct => ReflectedType::Struct(class),
        }
    }

    pub fn identity(&self) -> TypeIdentity {
        TypeIdentity(Arc::from(self.identity_string()))
    }

    fn identity_string(&self) -> String {
        match self {
            ReflectedType::Primitive(code) => code.cpp_name().to_string(),
            ReflectedType::Object(class) => format!("class {}", class.cpp_name()),
            ReflectedType::Struct(class) => format!("struct {}", class.cpp_name()),
            ReflectedType::Enum(host) => format!("enum {}", host.cpp_name()),
            ReflectedType::Array(element) => format!("TArray<{}>", element.identity_string()),
            ReflectedType::Set(element) => format!("TSet<{}>", element.identity_string()),
            ReflectedType::Map(key, value) => format!(
                "TMap<{}, {}>",
                key.identity_string(),
                value.identity_string()
            ),
            ReflectedType::TypeObject => "type".to_string(),
        }
    }

    /// Reflection-side spelling, e.g. `UTestObject*` or `TMap<FString, int32>`
    pub fn cpp_type(&self) -> String {
        match self {
            ReflectedType::Primitive(code) => code.cpp_name().to_string(),
            ReflectedType::Object(class) => format!("{}*", class.cpp_name()),
            ReflectedType::Struct(class) => class.cpp_name(),
            ReflectedType::Enum(host) => host.cpp_name(),
            ReflectedType::Array(element) => format!("TArray<{}>", element.cpp_type()),
            ReflectedType::Set(element) => format!("TSet<{}>", element.cpp_type()),
            ReflectedType::Map(key, value) => {
                format!("TMap<{}, {}>", key.cpp_type(), value.cpp_type())
            }
            ReflectedType::TypeObject => "UClass*".to_string(),
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            ReflectedType::Primitive(code) => *code,
            ReflectedType::Object(_) => TypeCode::ObjectPtr,
            ReflectedType::Enum(_) => TypeCode::Enum,
            ReflectedType::Struct(_)
            | ReflectedType::Array(_)
            | ReflectedType::Set(_)
            | ReflectedType::Map(_, _)
            | ReflectedType::TypeObject => TypeCode::Struct,
        }
    }

    pub fn can_be_null(&self) -> bool {
        match self {
            ReflectedType::Primitive(code) => code.can_be_null(),
            ReflectedType::Object(_) | ReflectedType::TypeObject => true,
            _ => false,
        }
    }

    pub fn class(&self) -> Option<&ClassRef> {
        match self {
            ReflectedType::Object(class) | ReflectedType::Struct(class) => Some(class),
            _ => None,
        }
    }

    /// Canonical zero value of the slot
    pub fn default_value(&self) -> Value {
        match self {
            ReflectedType::Primitive(code) => match code {
                TypeCode::Boolean => Value::Boolean(false),
                TypeCode::UInt8 => Value::UInt8(0),
                TypeCode::UInt16 => Value::UInt16(0),
                TypeCode::UInt32 => Value::UInt32(0),
                TypeCode::UInt64 => Value::UInt64(0),
                TypeCode::Int8 => Value::Int8(0),
                TypeCode::Int16 => Value::Int16(0),
                TypeCode::Int32 => Value::Int32(0),
                TypeCode::Int64 => Value::Int64(0),
                TypeCode::Float => Value::Float(0.0),
                TypeCode::Double => Value::Double(0.0),
                TypeCode::Timespan => Value::Timespan(TimeDelta::zero()),
                TypeCode::DateTime => Value::DateTime(NaiveDateTime::default()),
                TypeCode::String => Value::string(""),
                TypeCode::Name => Value::name(""),
                TypeCode::Text => Value::text(""),
                TypeCode::Null | TypeCode::ObjectPtr | TypeCode::Struct | TypeCode::Enum => {
                    Value::Null
                }
            },
            ReflectedType::Object(_) | ReflectedType::TypeObject => Value::Null,
            ReflectedType::Struct(class) => class.construct().unwrap_or(Value::Null),
            ReflectedType::Enum(host) => Value::Enum(EnumValue::new(
                host.clone(),
                host.literals().first().map(|(_, value)| *value).unwrap_or(0),
            )),
            ReflectedType::Array(element) => Value::Struct(StructValue::Array {
                element: (**element).clone(),
                items: Vec::new(),
            }),
            ReflectedType::Set(element) => Value::Struct(StructValue::Set {
                element: (**element).clone(),
                items: Vec::new(),
            }),
            ReflectedType::Map(key, value) => Value::Struct(StructValue::Map {
                key: (**key).clone(),
                value: (**value).clone(),
                entries: Vec::new(),
            }),
        }
    }

    /// Whether a value of `source` type may be stored in this slot as is
    pub fn is_assignable_from(&self, source: &ReflectedType) -> bool {
        match (self, source) {
            (ReflectedType::Primitive(TypeCode::ObjectPtr), ReflectedType::Object(_)) => true,
            (ReflectedType::Primitive(target), ReflectedType::Primitive(code)) => {
                target.is_assignable_from(*code)
            }
            (ReflectedType::Primitive(TypeCode::Null), _) => source.can_be_null(),
            (ReflectedType::Object(_), ReflectedType::Primitive(TypeCode::Null)) => true,
            (ReflectedType::Object(target), ReflectedType::Object(class))
            | (ReflectedType::Struct(target), ReflectedType::Struct(class)) => {
                is_child_of(class.as_ref(), target.as_ref())
            }
            (ReflectedType::Enum(target), ReflectedType::Enum(host)) => {
                target.cpp_name() == host.cpp_name()
            }
            (ReflectedType::Enum(_), ReflectedType::Primitive(code)) => code.is_unsigned(),
            (ReflectedType::Array(_), ReflectedType::Array(_))
            | (ReflectedType::Set(_), ReflectedType::Set(_))
            | (ReflectedType::Map(_, _), ReflectedType::Map(_, _)) => {
                self.identity() == source.identity()
            }
            (ReflectedType::TypeObject, ReflectedType::TypeObject)
            | (ReflectedType::TypeObject, ReflectedType::Primitive(TypeCode::Null)) => true,
            _ => false,
        }
    }
}

impl PartialEq for ReflectedType {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ReflectedType {}

impl fmt::Display for ReflectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cpp_type())
    }
}

impl From<TypeCode> for ReflectedType {
    fn from(code: TypeCode) -> Self {
        ReflectedType::Primitive(code)
    }
}
