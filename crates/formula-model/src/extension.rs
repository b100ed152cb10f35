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

//! Extension member discovery
//!
//! Primitive types have no members of their own. Their members come from a
//! surrogate class whose static functions follow a naming convention:
//!
//! - `Get<Name>(Self)` becomes the readable instance property `Name`
//! - `Set<Name>(Self, Value)` makes the matching property writable
//! - any other function whose first parameter is `Self` of the extended type
//!   becomes an instance method, called with the target as that parameter
//! - the remaining static functions stay static
//!
//! Public properties of the surrogate become static properties read from its
//! default instance. Getters are collected in a first pass so that setters and
//! methods can be told apart in the second.

use indexmap::IndexMap;
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::members::{FormulaFunction, FormulaProperty};
use crate::reflection::{
    ClassRef, FunctionRef, HostFunction, ReflectedType, all_functions, all_properties,
};
use crate::types::MemberTable;

pub const SELF_PARAMETER: &str = "Self";

fn takes_self(function: &dyn HostFunction, extended: &ReflectedType) -> bool {
    function
        .parameters()
        .first()
        .is_some_and(|parameter| parameter.name == SELF_PARAMETER && parameter.ty == *extended)
}

fn accessor_name<'a>(function: &'a dyn HostFunction, prefix: &str) -> Option<&'a str> {
    function
        .name()
        .strip_prefix(prefix)
        .filter(|name| !name.is_empty())
}

/// Build the member table of `extended` from the functions of `surrogate`
pub fn scan_surrogate(
    surrogate: &ClassRef,
    extended: &ReflectedType,
    declaring_type: &str,
) -> MemberTable {
    let mut table = MemberTable::default();

    for property in all_properties(surrogate.as_ref()) {
        if property.is_public() {
            table.add_property(
                FormulaProperty::reflected(property, declaring_type)
                    .with_default_instance(surrogate.clone()),
                true,
            );
        }
    }

    let functions: Vec<FunctionRef> = all_functions(surrogate.as_ref())
        .into_iter()
        .filter(|function| function.is_public() && function.is_static())
        .collect();

    let mut consumed: FxHashSet<usize> = FxHashSet::default();
    let mut getters: IndexMap<String, FunctionRef> = IndexMap::new();
    for (index, function) in functions.iter().enumerate() {
        if !takes_self(function.as_ref(), extended) || function.parameters().len() != 1 {
            continue;
        }
        if let Some(name) = accessor_name(function.as_ref(), "Get") {
            if !getters.contains_key(name) {
                getters.insert(name.to_string(), function.clone());
                consumed.insert(index);
            }
        }
    }

    let mut setters: FxHashMap<String, FunctionRef> = FxHashMap::default();
    for (index, function) in functions.iter().enumerate() {
        if consumed.contains(&index)
            || !takes_self(function.as_ref(), extended)
            || function.parameters().len() != 2
        {
            continue;
        }
        if let Some(name) = accessor_name(function.as_ref(), "Set") {
            if getters.contains_key(name) && !setters.contains_key(name) {
                setters.insert(name.to_string(), function.clone());
                consumed.insert(index);
            }
        }
    }

    for (name, getter) in getters {
        let setter = setters.remove(&name);
        trace!(
            "extension property {declaring_type}.{name} (writable: {})",
            setter.is_some()
        );
        table.add_property(
            FormulaProperty::extension(name, getter, setter, declaring_type),
            false,
        );
    }

    for (index, function) in functions.into_iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }
        if takes_self(function.as_ref(), extended) {
            table.add_function(FormulaFunction::extension(function, declaring_type), false);
        } else {
            table.add_function(FormulaFunction::new(function, declaring_type), true);
        }
    }

    table.log_populated(declaring_type);
    table
}
