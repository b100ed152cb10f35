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

//! Enum descriptor

use std::sync::Arc;

use formula_engine_core::TypeCode;
use once_cell::sync::OnceCell;

use super::{MemberTable, TypeDescriptor, TypeDescriptorRef};
use crate::dynamic::DynamicFunction;
use crate::members::{FormulaFunction, FormulaProperty};
use crate::reflection::{HostEnum, ReflectedType, TypeIdentity};
use crate::value::{EnumValue, Value};

/// Descriptor of a reflected enum. Literals are static properties.
#[derive(Debug)]
pub struct EnumType {
    host: Arc<HostEnum>,
    reflected: ReflectedType,
    identity: TypeIdentity,
    name: String,
    underlying: TypeDescriptorRef,
    members: OnceCell<MemberTable>,
}

impl EnumType {
    pub fn new(host: Arc<HostEnum>, underlying: TypeDescriptorRef) -> Self {
        let reflected = ReflectedType::Enum(host.clone());
        Self {
            name: host.cpp_name(),
            identity: reflected.identity(),
            reflected,
            host,
            underlying,
            members: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &Arc<HostEnum> {
        &self.host
    }

    fn populate(&self) -> MemberTable {
        let mut table = MemberTable::default();
        for (literal, value) in self.host.literals() {
            let host = self.host.clone();
            let value = *value;
            table.add_property(
                FormulaProperty::computed(literal, self.reflected.clone(), &self.name, move |_| {
                    Some(Value::Enum(EnumValue::new(host.clone(), value)))
                }),
                true,
            );
        }

        let to_string = DynamicFunction::builder("ToString")
            .returns(TypeCode::String.into())
            .build(|call| match call.target()? {
                Value::Enum(value) => Ok(Value::string(match value.ty.literal_name(value.value) {
                    Some(name) => name.to_string(),
                    None => value.value.to_string(),
                })),
                other => Err(format!("expected an enum target, got {}", other.type_name())),
            });
        table.add_function(FormulaFunction::new(to_string, &self.name), false);
        table.log_populated(&self.name);
        table
    }
}

impl TypeDescriptor for EnumType {
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

    fn underlying_type(&self) -> Option<TypeDescriptorRef> {
        Some(self.underlying.clone())
    }
}
