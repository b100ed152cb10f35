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

//! Class and struct descriptor

use once_cell::sync::OnceCell;

use super::{MemberTable, TypeDescriptor};
use crate::members::{FormulaFunction, FormulaProperty};
use crate::reflection::{ClassRef, ReflectedType, TypeIdentity, all_functions, all_properties};

/// Descriptor of a reflected class (object pointer) or struct (value type)
///
/// Every property is available both on instances and statically, where it is
/// read from the class default object. Functions are split by their static flag.
/// Custom operators are the static `op_*` functions.
#[derive(Debug)]
pub struct ClassType {
    class: ClassRef,
    reflected: ReflectedType,
    identity: TypeIdentity,
    name: String,
    members: OnceCell<MemberTable>,
}

impl ClassType {
    pub fn new(class: ClassRef) -> Self {
        let reflected = ReflectedType::of_class(class.clone());
        Self {
            name: class.cpp_name(),
            identity: reflected.identity(),
            reflected,
            class,
            members: OnceCell::new(),
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    fn populate(&self) -> MemberTable {
        let mut table = MemberTable::default();
        for property in all_properties(self.class.as_ref()) {
            if !property.is_public() {
                continue;
            }
            table.add_property(FormulaProperty::reflected(property.clone(), &self.name), false);
            table.add_property(
                FormulaProperty::reflected(property, &self.name)
                    .with_default_instance(self.class.clone()),
                true,
            );
        }
        for function in all_functions(self.class.as_ref()) {
            if !function.is_public() {
                continue;
            }
            let is_static = function.is_static();
            table.add_function(FormulaFunction::new(function, &self.name), is_static);
        }
        table.log_populated(&self.name);
        table
    }
}

impl TypeDescriptor for ClassType {
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

    fn is_abstract(&self) -> bool {
        self.class.is_abstract()
    }
}
