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

//! Primitive type descriptor

use formula_engine_core::TypeCode;
use once_cell::sync::OnceCell;

use super::{MemberTable, TypeDescriptor};
use crate::extension::scan_surrogate;
use crate::reflection::{ClassRef, ReflectedType, TypeIdentity};

/// Descriptor of a primitive type code, with members taken from an optional surrogate class
#[derive(Debug)]
pub struct PrimitiveType {
    code: TypeCode,
    reflected: ReflectedType,
    identity: TypeIdentity,
    surrogate: Option<ClassRef>,
    members: OnceCell<MemberTable>,
}

impl PrimitiveType {
    pub fn new(code: TypeCode, surrogate: Option<ClassRef>) -> Self {
        let reflected = ReflectedType::Primitive(code);
        Self {
            code,
            identity: reflected.identity(),
            reflected,
            surrogate,
            members: OnceCell::new(),
        }
    }

    pub fn surrogate(&self) -> Option<&ClassRef> {
        self.surrogate.as_ref()
    }
}

impl TypeDescriptor for PrimitiveType {
    fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    fn reflected_type(&self) -> &ReflectedType {
        &self.reflected
    }

    fn type_name(&self) -> &str {
        match self.code {
            TypeCode::ObjectPtr => "UObject",
            code => code.cpp_name(),
        }
    }

    fn members(&self) -> &MemberTable {
        self.members.get_or_init(|| match &self.surrogate {
            Some(surrogate) => scan_surrogate(surrogate, &self.reflected, self.type_name()),
            None => MemberTable::default(),
        })
    }

    fn type_code(&self) -> TypeCode {
        self.code
    }
}
