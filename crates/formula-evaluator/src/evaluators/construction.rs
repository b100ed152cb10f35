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

//! Object, struct and container construction
//!
//! Covers `new T()`, sized and initialized arrays, member initializers and
//! collection initializers. Initializers run in document order against a
//! freshly constructed value.

use formula_engine_ast::{
    ElementInit, ListInitExpression, MemberBinding, MemberBindingKind, MemberInitExpression,
    NewArrayBoundsExpression, NewArrayInitExpression, NewExpression,
};
use formula_engine_core::{FormulaError, Result, TypeCode, TypeReference};
use formula_engine_model::{ReflectedType, StructValue, TypeDescriptorRef, Value};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::engine::FormulaEngine;

const ARRAY_TYPE_NAMES: [&str; 2] = ["Array", "System.Array"];

impl FormulaEngine {
    pub(crate) fn evaluate_new(
        &self,
        new: &NewExpression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
    ) -> Result<Value> {
        if !new.arguments.is_empty() {
            return Err(FormulaError::invalid_expression(
                "Constructors with arguments are not supported.",
            ));
        }

        let descriptor = self.resolve_type(&new.target, context)?;
        let type_name = descriptor.type_name();
        match descriptor.reflected_type() {
            ReflectedType::Object(class) => {
                if class.is_abstract() {
                    return Err(FormulaError::abstract_instantiation(type_name));
                }
                class
                    .construct()
                    .ok_or_else(|| FormulaError::unsupported_object_type(type_name))
            }
            ReflectedType::Struct(class) => match expected {
                Some(slot) if slot.is_assignable_from(descriptor.as_ref()) => class
                    .construct()
                    .ok_or_else(|| FormulaError::unsupported_object_type(type_name)),
                _ => Err(FormulaError::unsolicited_struct_type(type_name)),
            },
            ReflectedType::Array(_) | ReflectedType::Set(_) | ReflectedType::Map(_, _) => {
                Ok(descriptor.default_value())
            }
            ReflectedType::Primitive(
                TypeCode::Null | TypeCode::ObjectPtr | TypeCode::Struct | TypeCode::Enum,
            )
            | ReflectedType::Enum(_)
            | ReflectedType::TypeObject => Err(FormulaError::unsupported_object_type(type_name)),
            ReflectedType::Primitive(_) => Ok(descriptor.default_value()),
        }
    }

    pub(crate) fn evaluate_new_array_bounds(
        &self,
        bounds: &NewArrayBoundsExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let element = self.array_element_type(&bounds.array_type, context)?;
        let sizes = bounds
            .arguments
            .values()
            .map(|argument| self.evaluate(argument, context, None, depth))
            .collect::<Result<Vec<_>>>()?;

        let size = match sizes.as_slice() {
            [size] if size.type_code().is_integral() => size
                .as_i128()
                .and_then(|size| usize::try_from(size).ok())
                .ok_or_else(|| FormulaError::invalid_array_size(size.type_name()))?,
            [size] => return Err(FormulaError::invalid_array_size(size.type_name())),
            others => {
                let types: Vec<String> = others.iter().map(Value::type_name).collect();
                return Err(FormulaError::invalid_array_size(types.join(", ")));
            }
        };

        let limit = context.config().max_array_length;
        if size > limit {
            return Err(FormulaError::array_size_exceeds_limit(size, limit));
        }

        let mut array = ReflectedType::array(element).default_value();
        if let Some(items) = array.as_struct_mut() {
            items.resize(size);
        }
        Ok(array)
    }

    pub(crate) fn evaluate_new_array_init(
        &self,
        init: &NewArrayInitExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let element = self.array_element_type(&init.array_type, context)?;
        let element_descriptor = context.resolver().describe(&element);
        let array_type = ReflectedType::array(element.clone());

        let mut items = Vec::with_capacity(init.initializers.len());
        for initializer in &init.initializers {
            let value = self.evaluate(initializer, context, Some(&element_descriptor), depth)?;
            let converted = value.try_copy_into(&element).ok_or_else(|| {
                FormulaError::add_failed(array_type.cpp_type(), &[value.type_name()])
            })?;
            items.push(converted);
        }
        Ok(Value::Struct(StructValue::Array { element, items }))
    }

    pub(crate) fn evaluate_member_init(
        &self,
        init: &MemberInitExpression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
        depth: usize,
    ) -> Result<Value> {
        if !init.bindings.iter().all(MemberBinding::is_valid) {
            return Err(FormulaError::expression_is_invalid());
        }
        let mut instance = self.evaluate_new(&init.new, context, expected)?;
        self.apply_bindings(&mut instance, &init.bindings, context, depth)?;
        Ok(instance)
    }

    pub(crate) fn evaluate_list_init(
        &self,
        init: &ListInitExpression,
        context: &ExecutionContext,
        expected: Option<&TypeDescriptorRef>,
        depth: usize,
    ) -> Result<Value> {
        let mut container = self.evaluate_new(&init.new, context, expected)?;
        self.apply_element_inits(&mut container, &init.initializers, context, depth)?;
        Ok(container)
    }

    /// Element type of `Array<T>`
    fn array_element_type(
        &self,
        reference: &TypeReference,
        context: &ExecutionContext,
    ) -> Result<ReflectedType> {
        match reference.type_arguments() {
            [element] if ARRAY_TYPE_NAMES.contains(&reference.full_name(false)) => {
                self.resolve_reflected(element, context)
            }
            _ => Err(FormulaError::invalid_array_type(reference.full_name(true))),
        }
    }

    fn apply_bindings(
        &self,
        instance: &mut Value,
        bindings: &[MemberBinding],
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<()> {
        if instance.is_null() {
            return Err(FormulaError::null_reference());
        }

        for binding in bindings {
            let descriptor = context.resolver().type_of(instance);
            let property = descriptor
                .try_get_property(binding.name(), false)
                .ok_or_else(|| {
                    FormulaError::member_not_found(
                        descriptor.type_name(),
                        binding.name(),
                        &descriptor.property_names(false),
                    )
                })?;

            match &binding.kind {
                MemberBindingKind::Assignment(expression) => {
                    let slot = context.resolver().describe(property.value_type());
                    let value = self.evaluate(expression, context, Some(&slot), depth)?;
                    property.set_value(instance, value)?;
                }
                MemberBindingKind::MemberMember(nested) => {
                    let mut value = property.get_value(Some(&*instance))?;
                    self.apply_bindings(&mut value, nested, context, depth)?;
                    // Objects were updated in place
                    if !matches!(value, Value::Object(_)) {
                        property.set_value(instance, value)?;
                    }
                }
                MemberBindingKind::List(initializers) => {
                    let mut value = property.get_value(Some(&*instance))?;
                    if value.is_null() {
                        value = property.value_type().default_value();
                    }
                    self.apply_element_inits(&mut value, initializers, context, depth)?;
                    property.set_value(instance, value)?;
                }
            }
            trace!(member = binding.name(), "member binding applied");
        }
        Ok(())
    }

    fn apply_element_inits(
        &self,
        container: &mut Value,
        initializers: &[ElementInit],
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<()> {
        let type_name = container.type_name();
        let slots = match container.as_struct() {
            Some(StructValue::Array { element, .. } | StructValue::Set { element, .. }) => {
                vec![element.clone()]
            }
            Some(StructValue::Map { key, value, .. }) => vec![key.clone(), value.clone()],
            _ => return Err(FormulaError::unsupported_collection_type(type_name)),
        };
        let descriptors: Vec<TypeDescriptorRef> = slots
            .iter()
            .map(|slot| context.resolver().describe(slot))
            .collect();

        for initializer in initializers {
            let mut values = Vec::with_capacity(initializer.initializers.len());
            for (position, expression) in initializer.initializers.iter().enumerate() {
                values.push(self.evaluate(expression, context, descriptors.get(position), depth)?);
            }

            let add_failed = || {
                let types: Vec<String> = values.iter().map(Value::type_name).collect();
                FormulaError::add_failed(&type_name, &types)
            };
            if values.len() != slots.len() {
                return Err(add_failed());
            }
            let converted = values
                .iter()
                .zip(&slots)
                .map(|(value, slot)| value.try_copy_into(slot))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(add_failed)?;

            let collection = container
                .as_struct_mut()
                .ok_or_else(|| FormulaError::unsupported_collection_type(&type_name))?;
            let added = match <[Value; 2]>::try_from(converted) {
                Ok([key, value]) => collection.insert(key, value),
                Err(single) => single.into_iter().all(|value| collection.append(value)),
            };
            if !added {
                return Err(add_failed());
            }
        }

        if let Some(collection) = container.as_struct_mut() {
            collection.rehash();
        }
        Ok(())
    }
}
