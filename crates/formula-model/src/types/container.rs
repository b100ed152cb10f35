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

//! Array, set and map descriptors

use formula_engine_core::TypeCode;
use once_cell::sync::OnceCell;

use super::{MemberTable, TypeDescriptor};
use crate::dynamic::DynamicFunction;
use crate::members::{FormulaFunction, FormulaProperty};
use crate::reflection::{HostCall, ReflectedType, TypeIdentity};
use crate::value::Value;

/// Descriptor of a container type
///
/// Containers expose `Count`, plus `Contains(Value)` for arrays and sets and
/// `ContainsKey(Key)` for maps.
#[derive(Debug)]
pub struct ContainerType {
    reflected: ReflectedType,
    identity: TypeIdentity,
    name: String,
    members: OnceCell<MemberTable>,
}

impl ContainerType {
    /// `reflected` must be an array, set or map type
    pub fn new(reflected: ReflectedType) -> Self {
        Self {
            identity: reflected.identity(),
            name: reflected.cpp_type(),
            reflected,
            members: OnceCell::new(),
        }
    }

    /// Element type of arrays and sets, key type of maps
    pub fn element_type(&self) -> Option<&ReflectedType> {
        match &self.reflected {
            ReflectedType::Array(element) | ReflectedType::Set(element) => Some(element),
            ReflectedType::Map(key, _) => Some(key),
            _ => None,
        }
    }

    fn populate(&self) -> MemberTable {
        let mut table = MemberTable::default();
        table.add_property(
            FormulaProperty::computed("Count", TypeCode::Int32.into(), &self.name, |target| {
                let len = target.as_struct()?.len();
                Some(Value::Int32(i32::try_from(len).ok()?))
            }),
            false,
        );

        let (function_name, parameter_name, parameter_type) = match &self.reflected {
            ReflectedType::Map(key, _) => ("ContainsKey", "Key", (**key).clone()),
            ReflectedType::Array(element) | ReflectedType::Set(element) => {
                ("Contains", "Value", (**element).clone())
            }
            _ => {
                table.log_populated(&self.name);
                return table;
            }
        };
        let contains = DynamicFunction::builder(function_name)
            .parameter(parameter_name, parameter_type)
            .returns(TypeCode::Boolean.into())
            .build(|call: HostCall<'_>| {
                let container = call
                    .target()?
                    .as_struct()
                    .ok_or_else(|| "expected a container target".to_string())?;
                Ok(Value::Boolean(container.contains(call.argument(0)?)))
            });
        table.add_function(FormulaFunction::new(contains, &self.name), false);
        table.log_populated(&self.name);
        table
    }
}

impl TypeDescriptor for ContainerType {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn reflected_type(&self) -> &ReflectedType {
        &self.reflected
    }

    fn type_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &MemberTable {
        self.members.get_or_init(|| self.populate())
    }
}
