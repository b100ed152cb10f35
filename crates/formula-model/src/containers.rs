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

//! Container primitives on struct values
//!
//! Sequences, sets and maps are stored as plain vectors. Sets and maps compare
//! elements with [`Value`] equality, so lookups are linear scans.

use crate::reflection::ReflectedType;
use crate::value::{StructValue, Value};

impl StructValue {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            StructValue::Array { .. } | StructValue::Set { .. } | StructValue::Map { .. }
        )
    }

    /// Number of elements, zero for non-containers
    pub fn len(&self) -> usize {
        match self {
            StructValue::Array { items, .. } | StructValue::Set { items, .. } => items.len(),
            StructValue::Map { entries, .. } => entries.len(),
            StructValue::Record { .. } | StructValue::Type(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type for arrays and sets
    pub fn element_type(&self) -> Option<&ReflectedType> {
        match self {
            StructValue::Array { element, .. } | StructValue::Set { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Append at the end of a sequence, or add to a set. Sets ignore duplicates.
    pub fn append(&mut self, value: Value) -> bool {
        match self {
            StructValue::Array { items, .. } => {
                items.push(value);
                true
            }
            StructValue::Set { items, .. } => {
                if !items.contains(&value) {
                    items.push(value);
                }
                true
            }
            _ => false,
        }
    }

    /// Insert a key/value pair into a map, replacing the value of an existing key
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        match self {
            StructValue::Map { entries, .. } => {
                match entries.iter_mut().find(|(existing, _)| *existing == key) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((key, value)),
                }
                true
            }
            _ => false,
        }
    }

    /// Remove an element (sequence, set) or a key (map)
    pub fn remove(&mut self, key: &Value) -> bool {
        match self {
            StructValue::Array { items, .. } | StructValue::Set { items, .. } => {
                match items.iter().position(|item| item == key) {
                    Some(index) => {
                        items.remove(index);
                        true
                    }
                    None => false,
                }
            }
            StructValue::Map { entries, .. } => {
                let before = entries.len();
                entries.retain(|(existing, _)| existing != key);
                entries.len() != before
            }
            _ => false,
        }
    }

    /// Restore set/map uniqueness after bulk element writes. Later duplicates win for maps.
    pub fn rehash(&mut self) {
        match self {
            StructValue::Set { items, .. } => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items.drain(..) {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                *items = unique;
            }
            StructValue::Map { entries, .. } => {
                let mut unique: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
                for (key, value) in entries.drain(..) {
                    match unique.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(entry) => entry.1 = value,
                        None => unique.push((key, value)),
                    }
                }
                *entries = unique;
            }
            _ => {}
        }
    }

    /// Element at a position. Map positions yield the value of the n-th entry.
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        match self {
            StructValue::Array { items, .. } | StructValue::Set { items, .. } => items.get(index),
            StructValue::Map { entries, .. } => entries.get(index).map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn get_by_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            StructValue::Array { items, .. } | StructValue::Set { items, .. } => {
                items.get_mut(index)
            }
            StructValue::Map { entries, .. } => entries.get_mut(index).map(|(_, value)| value),
            _ => None,
        }
    }

    /// Value stored under `key` in a map
    pub fn find_key(&self, key: &Value) -> Option<&Value> {
        match self {
            StructValue::Map { entries, .. } => entries
                .iter()
                .find(|(existing, _)| existing == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Membership test: elements for sequences and sets, keys for maps
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            StructValue::Array { items, .. } | StructValue::Set { items, .. } => {
                items.contains(value)
            }
            StructValue::Map { .. } => self.find_key(value).is_some(),
            _ => false,
        }
    }

    /// Grow or shrink a sequence, filling with the element default
    pub fn resize(&mut self, len: usize) -> bool {
        match self {
            StructValue::Array { element, items } => {
                let filler = element.default_value();
                items.resize(len, filler);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_engine_core::TypeCode;
    use pretty_assertions::assert_eq;

    fn int32_set() -> StructValue {
        StructValue::Set {
            element: ReflectedType::Primitive(TypeCode::Int32),
            items: Vec::new(),
        }
    }

    fn string_map() -> StructValue {
        StructValue::Map {
            key: ReflectedType::Primitive(TypeCode::String),
            value: ReflectedType::Primitive(TypeCode::Int32),
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_set_ignores_duplicates() {
        let mut set = int32_set();
        assert!(set.append(Value::Int32(1)));
        assert!(set.append(Value::Int32(1)));
        assert!(set.append(Value::Int32(2)));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::Int32(2)));
    }

    #[test]
    fn test_map_insert_replaces() {
        let mut map = string_map();
        map.insert(Value::string("a"), Value::Int32(1));
        map.insert(Value::string("a"), Value::Int32(2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.find_key(&Value::string("a")), Some(&Value::Int32(2)));
        assert!(map.remove(&Value::string("a")));
        assert!(map.is_empty());
    }

    #[test]
    fn test_rehash_dedupes_map_keys() {
        let mut map = StructValue::Map {
            key: ReflectedType::Primitive(TypeCode::String),
            value: ReflectedType::Primitive(TypeCode::Int32),
            entries: vec![
                (Value::string("a"), Value::Int32(1)),
                (Value::string("b"), Value::Int32(2)),
                (Value::string("a"), Value::Int32(3)),
            ],
        };
        map.rehash();
        assert_eq!(map.len(), 2);
        assert_eq!(map.find_key(&Value::string("a")), Some(&Value::Int32(3)));
    }

    #[test]
    fn test_resize_fills_default() {
        let mut array = StructValue::Array {
            element: ReflectedType::Primitive(TypeCode::Int32),
            items: Vec::new(),
        };
        assert!(array.resize(3));
        assert_eq!(array.get_by_index(2), Some(&Value::Int32(0)));
        assert_eq!(array.get_by_index(3), None);
        assert!(!int32_set().resize(3));
    }
}
