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

//! Fixture host
//!
//! A small reflected object model used by the test suites, the benchmarks and
//! the documentation of the engine crates:
//!
//! - `UTestObject` with scalar, string, container, object and struct properties
//!   and a handful of instance and static functions
//! - `ATestActor`, a subclass of `UTestObject`
//! - `UAbstractObject`, which cannot be instantiated
//! - `FTestStruct` with custom `+`, `==` and an implicit conversion from `int32`
//! - `FLocalizedText`, a plain struct
//! - `EGameDataFormat`, a `uint8` enum
//!
//! ```
//! use formula_engine_model::testing;
//!
//! let object = testing::new_test_object();
//! assert_eq!(testing::get_field(&object, "Int32Prop"), Some(123.into()));
//! ```

use std::fmt;
use std::sync::Arc;

use formula_engine_core::TypeCode;
use once_cell::sync::{Lazy, OnceCell};

use crate::dynamic::{DynamicClass, DynamicFunction, DynamicObject};
use crate::reflection::{
    ClassRef, FunctionRef, HostCall, HostClass, HostEnum, HostFunction, HostParameter,
    HostProperty, ReflectedType,
};
use crate::resolver::TypeResolver;
use crate::value::{StructValue, Value};

static TEST_STRUCT: Lazy<Arc<DynamicClass>> = Lazy::new(|| {
    DynamicClass::builder("TestStruct")
        .structure()
        .property("Int32Field", TypeCode::Int32.into())
        .property("StringField", TypeCode::String.into())
        .function(LazyFunction::operator("op_Addition", struct_pair, struct_type, add_structs))
        .function(LazyFunction::operator(
            "op_Equality",
            struct_pair,
            || TypeCode::Boolean.into(),
            structs_equal,
        ))
        .function(LazyFunction::operator(
            "op_Implicit",
            || vec![HostParameter::new("Value", TypeCode::Int32.into())],
            struct_type,
            struct_from_int32,
        ))
        .build()
});

static LOCALIZED_TEXT: Lazy<Arc<DynamicClass>> = Lazy::new(|| {
    DynamicClass::builder("LocalizedText")
        .structure()
        .property("Key", TypeCode::String.into())
        .property("Text", TypeCode::Text.into())
        .build()
});

static GAME_DATA_FORMAT: Lazy<Arc<HostEnum>> = Lazy::new(|| {
    Arc::new(
        HostEnum::new("GameDataFormat", TypeCode::UInt8)
            .with_literal("Json", 0)
            .with_literal("MessagePack", 1)
            .with_literal("Bson", 2),
    )
});

static ABSTRACT_OBJECT: Lazy<Arc<DynamicClass>> = Lazy::new(|| {
    DynamicClass::builder("AbstractObject")
        .abstract_class()
        .property("Id", TypeCode::Int32.into())
        .build()
});

static TEST_OBJECT: Lazy<Arc<DynamicClass>> = Lazy::new(|| {
    DynamicClass::builder("TestObject")
        .property_with_default("Int32Prop", TypeCode::Int32.into(), Value::Int32(123))
        .property("StringProp", TypeCode::String.into())
        .property("NameProp", TypeCode::Name.into())
        .property("TextProp", TypeCode::Text.into())
        .property("Int32Array", ReflectedType::array(TypeCode::Int32.into()))
        .property("Int32Set", ReflectedType::set(TypeCode::Int32.into()))
        .property(
            "Int32Map",
            ReflectedType::map(TypeCode::String.into(), TypeCode::Int32.into()),
        )
        .property("FormatProp", ReflectedType::Enum(game_data_format()))
        .property("TestStructProp", ReflectedType::of_class(test_struct_class()))
        .host_property(Arc::new(ObjectProperty {
            name: "TestObjectProp",
            class: test_object_class,
        }))
        .host_property(Arc::new(ObjectProperty {
            name: "ActorProp",
            class: test_actor_class,
        }))
        .function(
            DynamicFunction::builder("TestFunctionNoParam")
                .returns(TypeCode::Int32.into())
                .build(|call: HostCall<'_>| int32_field(call.target()?, "Int32Prop")),
        )
        .function(
            DynamicFunction::builder("TestFunctionUint8Param")
                .parameter("InValue", TypeCode::UInt8.into())
                .returns(TypeCode::Int32.into())
                .build(|call: HostCall<'_>| {
                    let base = int32_field(call.target()?, "Int32Prop")?.as_i64().unwrap_or(0);
                    let value = call.argument(0)?.as_i64().unwrap_or(0);
                    Ok(Value::Int32((base + value) as i32))
                }),
        )
        .function(
            DynamicFunction::builder("TestFunctionOutParam")
                .out_parameter("OutParameter", TypeCode::Int32.into())
                .build(|mut call: HostCall<'_>| {
                    let value = int32_field(call.target()?, "Int32Prop")?;
                    let slot = call
                        .arguments
                        .first_mut()
                        .ok_or_else(|| "missing output slot".to_string())?;
                    *slot = value;
                    Ok(Value::Null)
                }),
        )
        .function(
            DynamicFunction::builder("TestFunctionStructParam")
                .parameter("InStruct", ReflectedType::of_class(test_struct_class()))
                .returns(TypeCode::Int32.into())
                .build(|call: HostCall<'_>| {
                    struct_field(call.argument(0)?, "Int32Field")
                        .ok_or_else(|| "expected FTestStruct".to_string())
                }),
        )
        .function(
            DynamicFunction::builder("StaticTestFunctionNoParam")
                .static_function()
                .returns(TypeCode::Int32.into())
                .build(|_call: HostCall<'_>| {
                    let default_object = test_object_class()
                        .default_instance()
                        .ok_or_else(|| "no default object".to_string())?;
                    int32_field(&default_object, "Int32Prop")
                }),
        )
        .build()
});

static TEST_ACTOR: Lazy<Arc<DynamicClass>> = Lazy::new(|| {
    DynamicClass::builder("TestActor")
        .prefix("A")
        .super_class(test_object_class())
        .property("Label", TypeCode::String.into())
        .build()
});

pub fn test_object_class() -> ClassRef {
    TEST_OBJECT.clone()
}

pub fn test_actor_class() -> ClassRef {
    TEST_ACTOR.clone()
}

pub fn abstract_object_class() -> ClassRef {
    ABSTRACT_OBJECT.clone()
}

pub fn test_struct_class() -> ClassRef {
    TEST_STRUCT.clone()
}

pub fn localized_text_class() -> ClassRef {
    LOCALIZED_TEXT.clone()
}

pub fn game_data_format() -> Arc<HostEnum> {
    GAME_DATA_FORMAT.clone()
}

/// Every fixture class
pub fn known_classes() -> Vec<ClassRef> {
    vec![
        test_object_class(),
        test_actor_class(),
        abstract_object_class(),
        test_struct_class(),
        localized_text_class(),
    ]
}

/// Resolver knowing the fixture classes and enum
pub fn resolver() -> Arc<TypeResolver> {
    known_classes()
        .into_iter()
        .fold(TypeResolver::builder(), |builder, class| builder.known_class(class))
        .known_enum(game_data_format())
        .build()
}

pub fn new_test_object() -> Value {
    test_object_class().construct().unwrap_or_default()
}

pub fn new_test_actor() -> Value {
    test_actor_class().construct().unwrap_or_default()
}

pub fn new_test_struct(int32_field: i32, string_field: &str) -> Value {
    let mut value = test_struct_class().construct().unwrap_or_default();
    if let Some(StructValue::Record { fields, .. }) = value.as_struct_mut() {
        fields.insert("Int32Field".to_string(), Value::Int32(int32_field));
        fields.insert("StringField".to_string(), Value::string(string_field));
    }
    value
}

/// Read a field of a fixture object or struct
pub fn get_field(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Object(object) => object.as_any().downcast_ref::<DynamicObject>()?.field(name),
        _ => struct_field(value, name),
    }
}

/// Overwrite a field of a fixture object
pub fn set_field(value: &Value, name: &str, field: Value) -> bool {
    value
        .as_object()
        .and_then(|object| object.as_any().downcast_ref::<DynamicObject>())
        .is_some_and(|object| object.set_field(name, field))
}

fn struct_field(value: &Value, name: &str) -> Option<Value> {
    match value.as_struct()? {
        StructValue::Record { fields, .. } => fields.get(name).cloned(),
        _ => None,
    }
}

fn int32_field(target: &Value, name: &str) -> Result<Value, String> {
    get_field(target, name).ok_or_else(|| format!("{} has no field {name}", target.type_name()))
}

fn struct_type() -> ReflectedType {
    ReflectedType::of_class(test_struct_class())
}

fn struct_pair() -> Vec<HostParameter> {
    vec![
        HostParameter::new("A", struct_type()),
        HostParameter::new("B", struct_type()),
    ]
}

fn struct_int32(call: &HostCall<'_>, index: usize) -> Result<i64, String> {
    struct_field(call.argument(index)?, "Int32Field")
        .and_then(|field| field.as_i64())
        .ok_or_else(|| format!("argument {index} is not an FTestStruct"))
}

fn add_structs(call: HostCall<'_>) -> Result<Value, String> {
    let sum = struct_int32(&call, 0)?.wrapping_add(struct_int32(&call, 1)?);
    let label = struct_field(call.argument(0)?, "StringField")
        .and_then(|field| field.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(new_test_struct(sum as i32, &label))
}

fn structs_equal(call: HostCall<'_>) -> Result<Value, String> {
    Ok(Value::Boolean(
        struct_int32(&call, 0)? == struct_int32(&call, 1)?,
    ))
}

fn struct_from_int32(call: HostCall<'_>) -> Result<Value, String> {
    let value = call
        .argument(0)?
        .as_i64()
        .ok_or_else(|| "expected int32".to_string())?;
    Ok(new_test_struct(value as i32, ""))
}

/// Object-typed property whose class is looked up on first use,
/// so a class can hold properties of its own type or of its subclasses.
struct ObjectProperty {
    name: &'static str,
    class: fn() -> ClassRef,
}

impl HostProperty for ObjectProperty {
    fn name(&self) -> &str {
        self.name
    }

    fn value_type(&self) -> ReflectedType {
        ReflectedType::Object((self.class)())
    }

    fn get(&self, target: &Value) -> Option<Value> {
        get_field(target, self.name)
    }

    fn set(&self, target: &mut Value, value: Value) -> bool {
        set_field(target, self.name, value)
    }

    fn default_value(&self) -> Value {
        Value::Null
    }
}

impl fmt::Debug for ObjectProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectProperty({})", self.name)
    }
}

type Signature = fn() -> Vec<HostParameter>;
type Body = fn(HostCall<'_>) -> Result<Value, String>;

/// Static function whose signature mentions its own declaring type
struct LazyFunction {
    name: &'static str,
    parameters: Signature,
    return_type: fn() -> ReflectedType,
    resolved: OnceCell<Vec<HostParameter>>,
    body: Body,
}

impl LazyFunction {
    fn operator(
        name: &'static str,
        parameters: Signature,
        return_type: fn() -> ReflectedType,
        body: Body,
    ) -> FunctionRef {
        Arc::new(Self {
            name,
            parameters,
            return_type,
            resolved: OnceCell::new(),
            body,
        })
    }
}

impl HostFunction for LazyFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn is_static(&self) -> bool {
        true
    }

    fn parameters(&self) -> &[HostParameter] {
        self.resolved.get_or_init(self.parameters)
    }

    fn return_type(&self) -> ReflectedType {
        (self.return_type)()
    }

    fn invoke(&self, call: HostCall<'_>) -> Result<Value, String> {
        (self.body)(call)
    }
}

impl fmt::Debug for LazyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "static {}(..)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::InvokeArguments;
    use crate::reflection::is_child_of;
    use formula_engine_core::{BinaryOperation, TypeReference};
    use pretty_assertions::assert_eq;

    fn describe(name: &str) -> crate::types::TypeDescriptorRef {
        resolver()
            .resolve(&TypeReference::parse(name).unwrap())
            .unwrap()
    }

    #[test]
    fn test_object_defaults() {
        let object = new_test_object();
        assert_eq!(object.type_name(), "UTestObject*");
        assert_eq!(get_field(&object, "Int32Prop"), Some(Value::Int32(123)));
        assert_eq!(get_field(&object, "TestObjectProp"), Some(Value::Null));
        assert_eq!(
            get_field(&object, "TestStructProp").map(|v| v.type_name()),
            Some("FTestStruct".to_string())
        );
    }

    #[test]
    fn test_actor_is_test_object() {
        let actor = new_test_actor();
        assert!(is_child_of(
            test_actor_class().as_ref(),
            test_object_class().as_ref()
        ));
        assert_eq!(get_field(&actor, "Int32Prop"), Some(Value::Int32(123)));
        assert_eq!(get_field(&actor, "Label"), Some(Value::string("")));
    }

    #[test]
    fn test_abstract_class_cannot_construct() {
        assert!(abstract_object_class().construct().is_none());
        assert!(describe("UAbstractObject").is_abstract());
    }

    #[test]
    fn test_out_parameter() {
        let descriptor = describe("UTestObject");
        let object = new_test_object();
        set_field(&object, "Int32Prop", Value::Int32(7));

        let group = descriptor
            .try_get_function("TestFunctionOutParam", false)
            .unwrap();
        let mut arguments = InvokeArguments::new();
        arguments.insert("OutParameter", Value::Int32(0));
        group.invoke(Some(&object), &mut arguments, &[]).unwrap();
        assert_eq!(arguments.updated().get("OutParameter"), Some(&Value::Int32(7)));
    }

    #[test]
    fn test_static_function_reads_default_object() {
        let group = describe("TestObject")
            .try_get_function("StaticTestFunctionNoParam", true)
            .unwrap();
        let result = group
            .invoke(None, &mut InvokeArguments::new(), &[])
            .unwrap();
        assert_eq!(result, Value::Int32(123));
    }

    #[test]
    fn test_struct_operators() {
        let descriptor = describe("FTestStruct");
        let add = descriptor
            .try_get_binary_operation(BinaryOperation::Add)
            .unwrap();
        let mut arguments = InvokeArguments::positional([
            new_test_struct(2, "left"),
            new_test_struct(3, "right"),
        ]);
        let sum = add.invoke(None, &mut arguments, &[]).unwrap();
        assert_eq!(get_field(&sum, "Int32Field"), Some(Value::Int32(5)));

        let int32 = describe("int32");
        assert!(descriptor.try_get_conversion_operation(int32.as_ref()).is_some());
        assert!(descriptor
            .try_get_binary_operation(BinaryOperation::Subtract)
            .is_none());
    }

    #[test]
    fn test_enum_is_known() {
        let descriptor = describe("EGameDataFormat");
        assert_eq!(
            descriptor.property_names(true),
            vec!["Json", "MessagePack", "Bson"]
        );
    }
}
