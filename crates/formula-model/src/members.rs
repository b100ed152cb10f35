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

//! Member bindings
//!
//! A [`FormulaProperty`] or [`FormulaFunction`] pairs a host member with the
//! type it was found on. Properties hide whether they are read through direct
//! reflection, through a synthesized extension getter/setter pair or through a
//! computed accessor. Functions hide whether the target travels as the call
//! target or as a leading `Self` argument.

use std::fmt;
use std::sync::Arc;

use formula_engine_core::{FormulaError, Result};
use indexmap::IndexMap;
use log::{debug, trace};

use crate::reflection::{ClassRef, FunctionRef, HostCall, PropertyRef, ReflectedType};
use crate::value::Value;

pub type ComputedGetter = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// How a property value is read and written
#[derive(Clone)]
pub enum PropertyAccessor {
    /// Direct reflection access
    Reflected(PropertyRef),
    /// `Get<Name>(Self)` / `Set<Name>(Self, Value)` function pair
    Extension {
        getter: FunctionRef,
        setter: Option<FunctionRef>,
    },
    /// Read-only value computed from the target
    Computed(ComputedGetter),
}

pub struct FormulaProperty {
    name: String,
    value_type: ReflectedType,
    declaring_type: String,
    default_instance_of: Option<ClassRef>,
    accessor: PropertyAccessor,
}

impl FormulaProperty {
    pub fn reflected(property: PropertyRef, declaring_type: impl Into<String>) -> Self {
        Self {
            name: property.name().to_string(),
            value_type: property.value_type(),
            declaring_type: declaring_type.into(),
            default_instance_of: None,
            accessor: PropertyAccessor::Reflected(property),
        }
    }

    pub fn extension(
        name: impl Into<String>,
        getter: FunctionRef,
        setter: Option<FunctionRef>,
        declaring_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type: getter.return_type(),
            declaring_type: declaring_type.into(),
            default_instance_of: None,
            accessor: PropertyAccessor::Extension { getter, setter },
        }
    }

    pub fn computed(
        name: impl Into<String>,
        value_type: ReflectedType,
        declaring_type: impl Into<String>,
        getter: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            declaring_type: declaring_type.into(),
            default_instance_of: None,
            accessor: PropertyAccessor::Computed(Arc::new(getter)),
        }
    }

    /// Read and write through the class default object instead of a target
    pub fn with_default_instance(mut self, class: ClassRef) -> Self {
        self.default_instance_of = Some(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ReflectedType {
        &self.value_type
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn use_default_instance(&self) -> bool {
        self.default_instance_of.is_some()
    }

    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    pub fn is_writable(&self) -> bool {
        match &self.accessor {
            PropertyAccessor::Reflected(_) => true,
            PropertyAccessor::Extension { setter, .. } => setter.is_some(),
            PropertyAccessor::Computed(_) => false,
        }
    }

    fn access_failed(&self) -> FormulaError {
        FormulaError::member_access_failed(&self.declaring_type, &self.name)
    }

    fn default_instance(&self) -> Result<Option<Value>> {
        match &self.default_instance_of {
            Some(class) => class
                .default_instance()
                .map(Some)
                .ok_or_else(|| self.access_failed()),
            None => Ok(None),
        }
    }

    /// Read the property. `target` is ignored for default-instance properties.
    pub fn get_value(&self, target: Option<&Value>) -> Result<Value> {
        let default_instance = self.default_instance()?;
        let target = default_instance.as_ref().or(target).unwrap_or(&Value::Null);

        let value = match &self.accessor {
            PropertyAccessor::Reflected(property) => property.get(target),
            PropertyAccessor::Extension { getter, .. } => {
                let mut arguments = [target.clone()];
                getter
                    .invoke(HostCall {
                        target: None,
                        arguments: &mut arguments,
                        type_arguments: &[],
                    })
                    .map_err(|message| {
                        debug!("extension getter {} failed: {message}", getter.name());
                    })
                    .ok()
            }
            PropertyAccessor::Computed(getter) => getter(target),
        };
        value.ok_or_else(|| self.access_failed())
    }

    /// Write the property on `target`, converting `value` to the property type
    pub fn set_value(&self, target: &mut Value, value: Value) -> Result<()> {
        let value = value.try_copy_into(&self.value_type).ok_or_else(|| {
            FormulaError::no_conversion(value.type_name(), self.value_type.cpp_type())
        })?;

        let mut default_instance = self.default_instance()?;
        let target = match default_instance.as_mut() {
            Some(instance) => instance,
            None => target,
        };

        match &self.accessor {
            PropertyAccessor::Reflected(property) => {
                if property.set(target, value) {
                    Ok(())
                } else {
                    Err(self.access_failed())
                }
            }
            PropertyAccessor::Extension {
                setter: Some(setter),
                ..
            } => {
                let mut arguments = [target.clone(), value];
                setter
                    .invoke(HostCall {
                        target: None,
                        arguments: &mut arguments,
                        type_arguments: &[],
                    })
                    .map_err(|message| {
                        debug!("extension setter {} failed: {message}", setter.name());
                        self.access_failed()
                    })?;
                let [updated_self, _] = arguments;
                *target = updated_self;
                Ok(())
            }
            PropertyAccessor::Extension { setter: None, .. } | PropertyAccessor::Computed(_) => {
                Err(self.access_failed())
            }
        }
    }
}

impl fmt::Debug for FormulaProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaProperty")
            .field("name", &self.name)
            .field("value_type", &self.value_type.cpp_type())
            .field("declaring_type", &self.declaring_type)
            .field("use_default_instance", &self.use_default_instance())
            .finish()
    }
}

/// Named call arguments
///
/// Positional arguments use their index as the key (`"0"`, `"1"`, ...).
/// Output parameter values written by a call are recorded in
/// [`updated`](Self::updated) under the key the argument was passed with.
#[derive(Debug, Clone, Default)]
pub struct InvokeArguments {
    values: IndexMap<String, Value>,
    updated: IndexMap<String, Value>,
}

impl InvokeArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        let mut arguments = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            arguments.insert(i.to_string(), value);
        }
        arguments
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Type names of the arguments in order, for diagnostics
    pub fn type_names(&self) -> Vec<String> {
        self.values.values().map(Value::type_name).collect()
    }

    /// Output parameter values written by the last call
    pub fn updated(&self) -> &IndexMap<String, Value> {
        &self.updated
    }

    fn record_update(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value.clone());
        self.updated.insert(key.to_string(), value);
    }
}

/// Arguments converted to the parameter types of one overload
pub struct BoundCall {
    values: Vec<Value>,
    /// Argument key bound to each parameter, `None` for the self slot or missing outputs
    keys: Vec<Option<String>>,
}

pub struct FormulaFunction {
    function: FunctionRef,
    declaring_type: String,
    self_parameter: bool,
}

impl FormulaFunction {
    pub fn new(function: FunctionRef, declaring_type: impl Into<String>) -> Self {
        Self {
            function,
            declaring_type: declaring_type.into(),
            self_parameter: false,
        }
    }

    /// Static host function called as an instance method with the target as first argument
    pub fn extension(function: FunctionRef, declaring_type: impl Into<String>) -> Self {
        Self {
            function,
            declaring_type: declaring_type.into(),
            self_parameter: true,
        }
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn host_function(&self) -> &FunctionRef {
        &self.function
    }

    pub fn return_type(&self) -> ReflectedType {
        self.function.return_type()
    }

    pub fn is_extension(&self) -> bool {
        self.self_parameter
    }

    /// Parameter types callers must supply, without the self slot
    pub fn parameter_types(&self) -> Vec<ReflectedType> {
        let skip = usize::from(self.self_parameter);
        self.function
            .parameters()
            .iter()
            .skip(skip)
            .map(|parameter| parameter.ty.clone())
            .collect()
    }

    /// Match `arguments` against the parameter list
    ///
    /// Parameters bind by name first, then by position. Every supplied argument
    /// must be consumed. Output parameters may be omitted.
    pub fn bind(&self, target: Option<&Value>, arguments: &InvokeArguments) -> Option<BoundCall> {
        let parameters = self.function.parameters();
        let mut values = Vec::with_capacity(parameters.len());
        let mut keys = Vec::with_capacity(parameters.len());

        let explicit = if self.self_parameter {
            let first = parameters.first()?;
            values.push(target.unwrap_or(&Value::Null).try_copy_into(&first.ty)?);
            keys.push(None);
            &parameters[1..]
        } else {
            parameters
        };

        let mut consumed = 0;
        for (position, parameter) in explicit.iter().enumerate() {
            let positional = position.to_string();
            let key = if arguments.contains(&parameter.name) {
                Some(parameter.name.clone())
            } else if arguments.contains(&positional) {
                Some(positional)
            } else {
                None
            };

            match key {
                Some(key) => {
                    let supplied = arguments.get(&key)?;
                    let value = match supplied.try_copy_into(&parameter.ty) {
                        Some(value) => value,
                        None if parameter.is_out => parameter.ty.default_value(),
                        None => {
                            trace!(
                                "argument {key} of {} does not convert to {}",
                                self.name(),
                                parameter.ty
                            );
                            return None;
                        }
                    };
                    values.push(value);
                    keys.push(Some(key));
                    consumed += 1;
                }
                None if parameter.is_out => {
                    values.push(parameter.ty.default_value());
                    keys.push(None);
                }
                None => return None,
            }
        }

        (consumed == arguments.len()).then_some(BoundCall { values, keys })
    }

    /// Bind and invoke
    pub fn invoke(
        &self,
        target: Option<&Value>,
        arguments: &mut InvokeArguments,
        type_arguments: &[ReflectedType],
    ) -> Result<Value> {
        let bound = self.bind(target, arguments).ok_or_else(|| {
            FormulaError::method_signature_mismatch(
                &self.declaring_type,
                self.name(),
                &arguments.type_names(),
            )
        })?;
        self.invoke_bound(target, bound, arguments, type_arguments)
    }

    pub fn invoke_bound(
        &self,
        target: Option<&Value>,
        bound: BoundCall,
        arguments: &mut InvokeArguments,
        type_arguments: &[ReflectedType],
    ) -> Result<Value> {
        let BoundCall { mut values, keys } = bound;
        let call_target = if self.self_parameter { None } else { target };

        let result = self
            .function
            .invoke(HostCall {
                target: call_target,
                arguments: &mut values,
                type_arguments,
            })
            .map_err(|message| {
                debug!(
                    "call to {}.{} failed: {message}",
                    self.declaring_type,
                    self.name()
                );
                FormulaError::member_call_failed(&self.declaring_type, self.name(), message)
            })?;

        for ((parameter, key), value) in self
            .function
            .parameters()
            .iter()
            .zip(keys.iter())
            .zip(values.into_iter())
        {
            if let (true, Some(key)) = (parameter.is_out, key) {
                arguments.record_update(key, value);
            }
        }
        Ok(result)
    }
}

impl fmt::Debug for FormulaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaFunction")
            .field("name", &self.name())
            .field("declaring_type", &self.declaring_type)
            .field("extension", &self.self_parameter)
            .finish()
    }
}

/// All overloads sharing a name. The first overload that binds wins.
#[derive(Debug, Clone, Default)]
pub struct MethodGroup {
    name: String,
    overloads: Vec<Arc<FormulaFunction>>,
}

impl MethodGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    pub fn with_overload(mut self, function: FormulaFunction) -> Self {
        self.push(function);
        self
    }

    pub fn push(&mut self, function: FormulaFunction) {
        self.overloads.push(Arc::new(function));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overloads(&self) -> &[Arc<FormulaFunction>] {
        &self.overloads
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }

    /// Overloads satisfying `predicate`, or `None` when there are none
    pub fn filtered(&self, predicate: impl Fn(&FormulaFunction) -> bool) -> Option<MethodGroup> {
        let overloads: Vec<_> = self
            .overloads
            .iter()
            .filter(|function| predicate(function))
            .cloned()
            .collect();
        (!overloads.is_empty()).then(|| MethodGroup {
            name: self.name.clone(),
            overloads,
        })
    }

    pub fn invoke(
        &self,
        target: Option<&Value>,
        arguments: &mut InvokeArguments,
        type_arguments: &[ReflectedType],
    ) -> Result<Value> {
        for function in &self.overloads {
            if let Some(bound) = function.bind(target, arguments) {
                return function.invoke_bound(target, bound, arguments, type_arguments);
            }
        }
        let declaring_type = self
            .overloads
            .first()
            .map(|function| function.declaring_type().to_string())
            .unwrap_or_default();
        Err(FormulaError::method_signature_mismatch(
            declaring_type,
            &self.name,
            &arguments.type_names(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynamicFunction;
    use formula_engine_core::{ErrorCode, TypeCode};
    use pretty_assertions::assert_eq;

    fn add_function() -> FormulaFunction {
        let function = DynamicFunction::builder("Add")
            .parameter("A", TypeCode::Int32.into())
            .parameter("B", TypeCode::Int32.into())
            .returns(TypeCode::Int32.into())
            .build(|call| {
                let a = call.argument(0)?.as_i64().unwrap_or_default();
                let b = call.argument(1)?.as_i64().unwrap_or_default();
                Ok(Value::Int32((a + b) as i32))
            });
        FormulaFunction::new(function, "FMath")
    }

    #[test]
    fn test_bind_by_name_and_position() {
        let function = add_function();
        let mut arguments = InvokeArguments::new();
        arguments.insert("B", Value::Int32(2));
        arguments.insert("0", Value::UInt8(40));
        let result = function.invoke(None, &mut arguments, &[]).unwrap();
        assert_eq!(result, Value::Int32(42));
    }

    #[test]
    fn test_bind_rejects_extra_arguments() {
        let function = add_function();
        let mut arguments = InvokeArguments::positional([
            Value::Int32(1),
            Value::Int32(2),
            Value::Int32(3),
        ]);
        let error = function.invoke(None, &mut arguments, &[]).unwrap_err();
        assert_eq!(error.code(), ErrorCode::BindMethodSignatureMismatch);
    }

    #[test]
    fn test_bind_rejects_narrowing() {
        let function = add_function();
        let arguments = InvokeArguments::positional([Value::Int64(1), Value::Int32(2)]);
        assert!(function.bind(None, &arguments).is_none());
    }

    #[test]
    fn test_out_parameter_recorded() {
        let function = DynamicFunction::builder("Produce")
            .out_parameter("Result", TypeCode::Int32.into())
            .build(|call| {
                call.arguments[0] = Value::Int32(7);
                Ok(Value::Null)
            });
        let function = FormulaFunction::new(function, "UProducer");
        let mut arguments = InvokeArguments::positional([Value::Null]);
        function.invoke(None, &mut arguments, &[]).unwrap();
        assert_eq!(arguments.updated().get("0"), Some(&Value::Int32(7)));
    }

    #[test]
    fn test_method_group_picks_first_binding_overload() {
        let text = DynamicFunction::builder("Describe")
            .parameter("Value", TypeCode::String.into())
            .returns(TypeCode::String.into())
            .build(|_| Ok(Value::string("text")));
        let number = DynamicFunction::builder("Describe")
            .parameter("Value", TypeCode::Int32.into())
            .returns(TypeCode::String.into())
            .build(|_| Ok(Value::string("number")));
        let group = MethodGroup::new("Describe")
            .with_overload(FormulaFunction::new(text, "UDescriber"))
            .with_overload(FormulaFunction::new(number, "UDescriber"));

        let mut arguments = InvokeArguments::positional([Value::Int32(1)]);
        assert_eq!(
            group.invoke(None, &mut arguments, &[]).unwrap(),
            Value::string("number")
        );
        let mut arguments = InvokeArguments::positional([Value::Boolean(true)]);
        assert!(group.invoke(None, &mut arguments, &[]).is_err());
    }
}
