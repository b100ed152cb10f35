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

//! Type descriptors
//!
//! A [`TypeDescriptor`] describes one reflected type for member and operator
//! lookup. Descriptors are created by the [`TypeResolver`](crate::TypeResolver),
//! cached by [`TypeIdentity`] and never mutated afterwards, except for their
//! member tables which are populated once on first use.

mod class;
mod container;
mod enumeration;
mod primitive;
mod unknown;

pub use class::ClassType;
pub use container::ContainerType;
pub use enumeration::EnumType;
pub use primitive::PrimitiveType;
pub use unknown::UnknownType;

use std::fmt;
use std::sync::Arc;

use formula_engine_core::{BinaryOperation, CONVERSION_FUNCTION_NAMES, TypeCode, UnaryOperation};
use indexmap::IndexMap;
use log::debug;

use crate::members::{FormulaFunction, FormulaProperty, MethodGroup};
use crate::reflection::{ReflectedType, TypeIdentity};
use crate::value::Value;

pub type TypeDescriptorRef = Arc<dyn TypeDescriptor>;

/// Runtime description of a reflected type
pub trait TypeDescriptor: Send + Sync + fmt::Debug {
    fn identity(&self) -> &TypeIdentity;

    fn reflected_type(&self) -> &ReflectedType;

    /// Reflection-side name without pointer decoration, e.g. `UTestObject` or `int32`
    fn type_name(&self) -> &str;

    /// Member and operator tables
    fn members(&self) -> &MemberTable;

    fn type_code(&self) -> TypeCode {
        self.reflected_type().type_code()
    }

    fn can_be_null(&self) -> bool {
        self.reflected_type().can_be_null()
    }

    fn is_abstract(&self) -> bool {
        false
    }

    fn is_assignable_from(&self, other: &dyn TypeDescriptor) -> bool {
        self.reflected_type()
            .is_assignable_from(other.reflected_type())
    }

    /// Integer type of an enum
    fn underlying_type(&self) -> Option<TypeDescriptorRef> {
        None
    }

    fn default_value(&self) -> Value {
        self.reflected_type().default_value()
    }

    fn property_names(&self, is_static: bool) -> Vec<String> {
        self.members().property_names(is_static)
    }

    fn function_names(&self, is_static: bool) -> Vec<String> {
        self.members().function_names(is_static)
    }

    fn try_get_property(&self, name: &str, is_static: bool) -> Option<Arc<FormulaProperty>> {
        self.members().property(name, is_static)
    }

    fn try_get_function(&self, name: &str, is_static: bool) -> Option<Arc<MethodGroup>> {
        self.members().function(name, is_static)
    }

    /// Custom binary operator registered on the type
    fn try_get_binary_operation(&self, operation: BinaryOperation) -> Option<Arc<MethodGroup>> {
        let name = operation.operator_function_name()?;
        self.members()
            .function(name, true)
            .and_then(|group| group.filtered(|function| function.parameter_types().len() == 2))
            .map(Arc::new)
    }

    /// Custom unary operator registered on the type
    fn try_get_unary_operation(&self, operation: UnaryOperation) -> Option<Arc<MethodGroup>> {
        let name = operation.operator_function_name()?;
        self.members()
            .function(name, true)
            .and_then(|group| group.filtered(|function| function.parameter_types().len() == 1))
            .map(Arc::new)
    }

    /// Custom conversion into this type from `from`
    ///
    /// Candidates are the one-parameter `op_Implicit`/`op_Explicit` overloads
    /// returning this type whose parameter accepts `from`.
    fn try_get_conversion_operation(&self, from: &dyn TypeDescriptor) -> Option<Arc<MethodGroup>> {
        let target = self.reflected_type();
        let source = from.reflected_type();
        CONVERSION_FUNCTION_NAMES.iter().find_map(|name| {
            self.members()
                .function(name, true)
                .and_then(|group| {
                    group.filtered(|function| {
                        let parameters = function.parameter_types();
                        function.return_type() == *target
                            && parameters.len() == 1
                            && (parameters[0] == *source
                                || parameters[0].is_assignable_from(source))
                    })
                })
                .map(Arc::new)
        })
    }
}

/// Members of a type, split by static and instance access
#[derive(Debug, Default)]
pub struct MemberTable {
    instance_properties: IndexMap<String, Arc<FormulaProperty>>,
    static_properties: IndexMap<String, Arc<FormulaProperty>>,
    instance_functions: IndexMap<String, Arc<MethodGroup>>,
    static_functions: IndexMap<String, Arc<MethodGroup>>,
}

impl MemberTable {
    /// Add a property. The first property registered under a name wins.
    pub fn add_property(&mut self, property: FormulaProperty, is_static: bool) {
        let table = if is_static {
            &mut self.static_properties
        } else {
            &mut self.instance_properties
        };
        table
            .entry(property.name().to_string())
            .or_insert_with(|| Arc::new(property));
    }

    /// Add a function to the method group of its name
    pub fn add_function(&mut self, function: FormulaFunction, is_static: bool) {
        let table = if is_static {
            &mut self.static_functions
        } else {
            &mut self.instance_functions
        };
        let name = function.name().to_string();
        let group = table
            .entry(name.clone())
            .or_insert_with(|| Arc::new(MethodGroup::new(name)));
        Arc::make_mut(group).push(function);
    }

    pub fn property(&self, name: &str, is_static: bool) -> Option<Arc<FormulaProperty>> {
        let table = if is_static {
            &self.static_properties
        } else {
            &self.instance_properties
        };
        table.get(name).cloned()
    }

    pub fn function(&self, name: &str, is_static: bool) -> Option<Arc<MethodGroup>> {
        let table = if is_static {
            &self.static_functions
        } else {
            &self.instance_functions
        };
        table.get(name).cloned()
    }

    pub fn property_names(&self, is_static: bool) -> Vec<String> {
        let table = if is_static {
            &self.static_properties
        } else {
            &self.instance_properties
        };
        table.keys().cloned().collect()
    }

    pub fn function_names(&self, is_static: bool) -> Vec<String> {
        let table = if is_static {
            &self.static_functions
        } else {
            &self.instance_functions
        };
        table.keys().cloned().collect()
    }

    pub(crate) fn log_populated(&self, type_name: &str) {
        debug!(
            "populated members of {type_name}: {} instance properties, {} static properties, {} instance functions, {} static functions",
            self.instance_properties.len(),
            self.static_properties.len(),
            self.instance_functions.len(),
            self.static_functions.len()
        );
    }
}
