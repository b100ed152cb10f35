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

//! Descriptor for types without reflection data

use super::{MemberTable, TypeDescriptor};
use crate::reflection::{ReflectedType, TypeIdentity};

/// Nullable, member-less descriptor. Describes types used as values.
#[derive(Debug)]
pub struct UnknownType {
    reflected: ReflectedType,
    identity: TypeIdentity,
    name: String,
    members: MemberTable,
}

impl UnknownType {
    pub fn type_object() -> Self {
        let reflected = ReflectedType::TypeObject;
        Self {
            identity: reflected.identity(),
            reflected,
            name: "System.Type".to_string(),
            members: MemberTable::default(),
        }
    }
}

impl TypeDescriptor for UnknownType {
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
        &self.members
    }

    fn can_be_null(&self) -> bool {
        true
    }
}
