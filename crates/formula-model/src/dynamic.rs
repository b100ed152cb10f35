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

//! Closure-backed host reflection
//!
//! Hosts without their own reflection system describe classes with
//! [`DynamicClass`]. Instances are [`DynamicObject`]s (classes) or record
//! struct values (structs) whose fields live in an ordered map. Functions are
//! plain closures over a [`HostCall`].
//!
//! ```rust
//! use formula_engine_core::TypeCode;
//! use formula_engine_model::dynamic::{DynamicClass, DynamicFunction};
//! use formula_engine_model::Value;
//!
//! let class = DynamicClass::builder("Counter")
//!     .property_with_default("Count", TypeCode::Int32.into(), Value::Int32(1))
//!     .function(
//!         DynamicFunction::builder("Describe")
//!             .returns(TypeCode::String.into())
//!             .build(|call| Ok(Value::string(call.target()?.type_name()))),
//!     )
//!     .build();
//! assert!(class.construct_object().is_some());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::reflection::{
    ClassKind, ClassRef, FunctionRef, HostCall, HostClass, HostFunction, HostObject,
    HostParameter, HostProperty, PropertyRef, ReflectedType, all_properties,
};
use crate::value::{StructValue, Value};

pub type FunctionBody = dyn Fn(HostCall<'_>) -> Result<Value, String> + Send + Sync;

pub struct DynamicClass {
    this: Weak<DynamicClass>,
    name: String,
    prefix: String,
    kind: ClassKind,
    is_abstract: bool,
    super_class: Option<ClassRef>,
    properties: Vec<PropertyRef>,
    functions: Vec<FunctionRef>,
    default_instance: OnceCell<Value>,
}

impl DynamicClass {
    pub fn builder(name: impl Into<String>) -> DynamicClassBuilder {
        DynamicClassBuilder {
            name: name.into(),
            prefix: "U".to_string(),
            kind: ClassKind::Class,
            is_abstract: false,
            super_class: None,
            properties: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn class_ref(&self) -> Option<ClassRef> {
        self.this.upgrade().map(|class| class as ClassRef)
    }

    fn instantiate(&self) -> Option<Value> {
        let class = self.class_ref()?;
        let fields: IndexMap<String, Value> = all_properties(class.as_ref())
            .into_iter()
            .map(|property| (property.name().to_string(), property.default_value()))
            .collect();
        Some(match self.kind {
            ClassKind::Class => Value::Object(Arc::new(DynamicObject {
                class,
                fields: RwLock::new(fields),
            })),
            ClassKind::Struct => Value::Struct(StructValue::Record { class, fields }),
        })
    }

    /// Construct and return the new object, if this is a non-abstract class
    pub fn construct_object(&self) -> Option<Arc<dyn HostObject>> {
        match self.construct()? {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl HostClass for DynamicClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn cpp_prefix(&self) -> &str {
        &self.prefix
    }

    fn kind(&self) -> ClassKind {
        self.kind
    }

    fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn super_class(&self) -> Option<ClassRef> {
        self.super_class.clone()
    }

    fn properties(&self) -> Vec<PropertyRef> {
        self.properties.clone()
    }

    fn functions(&self) -> Vec<FunctionRef> {
        self.functions.clone()
    }

    fn default_instance(&self) -> Option<Value> {
        self.default_instance
            .get_or_try_init(|| self.instantiate().ok_or(()))
            .ok()
            .cloned()
    }

    fn construct(&self) -> Option<Value> {
        if self.is_abstract {
            return None;
        }
        self.instantiate()
    }
}

impl fmt::Debug for DynamicClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicClass")
            .field("name", &self.cpp_name())
            .field("kind", &self.kind)
            .field("abstract", &self.is_abstract)
            .field("properties", &self.properties.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}

pub struct DynamicClassBuilder {
    name: String,
    prefix: String,
    kind: ClassKind,
    is_abstract: bool,
    super_class: Option<ClassRef>,
    properties: Vec<PropertyRef>,
    functions: Vec<FunctionRef>,
}

impl DynamicClassBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Value type with the `F` prefix
    pub fn structure(mut self) -> Self {
        self.kind = ClassKind::Struct;
        self.prefix = "F".to_string();
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn super_class(mut self, super_class: ClassRef) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn property(self, name: impl Into<String>, ty: ReflectedType) -> Self {
        let default = ty.default_value();
        self.property_with_default(name, ty, default)
    }

    pub fn property_with_default(
        mut self,
        name: impl Into<String>,
        ty: ReflectedType,
        default: Value,
    ) -> Self {
        self.properties.push(Arc::new(DynamicProperty {
            name: name.into(),
            ty,
            default,
        }));
        self
    }

    /// Add a property implemented by the host
    pub fn host_property(mut self, property: PropertyRef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn function(mut self, function: FunctionRef) -> Self {
        self.functions.push(function);
        self
    }

    pub fn build(self) -> Arc<DynamicClass> {
        Arc::new_cyclic(|this| DynamicClass {
            this: this.clone(),
            name: self.name,
            prefix: self.prefix,
            kind: self.kind,
            is_abstract: self.is_abstract,
            super_class: self.super_class,
            properties: self.properties,
            functions: self.functions,
            default_instance: OnceCell::new(),
        })
    }
}

/// Instance of a [`DynamicClass`]
pub struct DynamicObject {
    class: ClassRef,
    fields: RwLock<IndexMap<String, Value>>,
}

impl DynamicObject {
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Overwrite an existing field. Unknown names are rejected.
    pub fn set_field(&self, name: &str, value: Value) -> bool {
        match self.fields.write().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl HostObject for DynamicObject {
    fn class(&self) -> ClassRef {
        self.class.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicObject")
            .field("class", &self.class.cpp_name())
            .field("fields", &*self.fields.read())
            .finish()
    }
}

/// Field-backed property of a dynamic class
#[derive(Debug)]
pub struct DynamicProperty {
    name: String,
    ty: ReflectedType,
    default: Value,
}

impl HostProperty for DynamicProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> ReflectedType {
        self.ty.clone()
    }

    fn get(&self, target: &Value) -> Option<Value> {
        match target {
            Value::Object(object) => object
                .as_any()
                .downcast_ref::<DynamicObject>()?
                .field(&self.name),
            Value::Struct(StructValue::Record { fields, .. }) => fields.get(&self.name).cloned(),
            _ => None,
        }
    }

    fn set(&self, target: &mut Value, value: Value) -> bool {
        match target {
            Value::Object(object) => object
                .as_any()
                .downcast_ref::<DynamicObject>()
                .is_some_and(|object| object.set_field(&self.name, value)),
            Value::Struct(StructValue::Record { fields, .. }) => {
                fields.insert(self.name.clone(), value);
                true
            }
            _ => false,
        }
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }
}

/// Closure-backed function
pub struct DynamicFunction {
    name: String,
    is_static: bool,
    parameters: SmallVec<[HostParameter; 4]>,
    return_type: ReflectedType,
    body: Arc<FunctionBody>,
}

impl DynamicFunction {
    pub fn builder(name: impl Into<String>) -> DynamicFunctionBuilder {
        DynamicFunctionBuilder {
            name: name.into(),
            is_static: false,
            parameters: SmallVec::new(),
            return_type: ReflectedType::Primitive(formula_engine_core::TypeCode::Null),
        }
    }
}

impl HostFunction for DynamicFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn parameters(&self) -> &[HostParameter] {
        &self.parameters
    }

    fn return_type(&self) -> ReflectedType {
        self.return_type.clone()
    }

    fn invoke(&self, call: HostCall<'_>) -> Result<Value, String> {
        (self.body)(call)
    }
}

impl fmt::Debug for DynamicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.ty, parameter.name))
            .collect();
        write!(
            f,
            "{}{} {}({})",
            if self.is_static { "static " } else { "" },
            self.return_type,
            self.name,
            parameters.join(", ")
        )
    }
}

pub struct DynamicFunctionBuilder {
    name: String,
    is_static: bool,
    parameters: SmallVec<[HostParameter; 4]>,
    return_type: ReflectedType,
}

impl DynamicFunctionBuilder {
    pub fn static_function(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, ty: ReflectedType) -> Self {
        self.parameters.push(HostParameter::new(name, ty));
        self
    }

    pub fn out_parameter(mut self, name: impl Into<String>, ty: ReflectedType) -> Self {
        self.parameters.push(HostParameter::out(name, ty));
        self
    }

    pub fn returns(mut self, ty: ReflectedType) -> Self {
        self.return_type = ty;
        self
    }

    pub fn build<F>(self, body: F) -> FunctionRef
    where
        F: Fn(HostCall<'_>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Arc::new(DynamicFunction {
            name: self.name,
            is_static: self.is_static,
            parameters: self.parameters,
            return_type: self.return_type,
            body: Arc::new(body),
        })
    }
}
