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

//! Type resolution
//!
//! A [`TypeResolver`] turns symbolic [`TypeReference`]s and structural
//! [`ReflectedType`]s into [`TypeDescriptor`]s. Names are looked up in the
//! resolver's own known types, then in the built-in primitive names, then in the
//! parent resolver. Descriptors are cached by identity in a [`DescriptorCache`]
//! shared by the whole resolver tree.

use std::fmt;
use std::sync::Arc;

use formula_engine_core::{TypeCode, TypeReference};
use log::trace;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::builtins::{Surrogates, default_surrogates};
use crate::cache::DescriptorCache;
use crate::reflection::{ClassRef, HostEnum, ReflectedType};
use crate::types::{
    ClassType, ContainerType, EnumType, PrimitiveType, TypeDescriptorRef, UnknownType,
};
use crate::value::Value;

static BUILTIN_NAMES: Lazy<FxHashMap<&'static str, ReflectedType>> = Lazy::new(|| {
    let mut names = FxHashMap::default();
    let mut add = |aliases: &[&'static str], ty: ReflectedType| {
        for alias in aliases {
            names.insert(*alias, ty.clone());
        }
    };
    let primitive = ReflectedType::Primitive;

    add(&["bool", "Boolean", "System.Boolean"], primitive(TypeCode::Boolean));
    add(&["uint8", "byte", "Byte", "System.Byte"], primitive(TypeCode::UInt8));
    add(
        &["uint16", "ushort", "UInt16", "System.UInt16", "char", "Char", "System.Char"],
        primitive(TypeCode::UInt16),
    );
    add(&["uint32", "uint", "UInt32", "System.UInt32"], primitive(TypeCode::UInt32));
    add(&["uint64", "ulong", "UInt64", "System.UInt64"], primitive(TypeCode::UInt64));
    add(&["int8", "sbyte", "SByte", "System.SByte"], primitive(TypeCode::Int8));
    add(&["int16", "short", "Int16", "System.Int16"], primitive(TypeCode::Int16));
    add(&["int32", "int", "Int32", "System.Int32"], primitive(TypeCode::Int32));
    add(&["int64", "long", "Int64", "System.Int64"], primitive(TypeCode::Int64));
    add(&["float", "Single", "System.Single"], primitive(TypeCode::Float));
    add(
        &["double", "Double", "System.Double", "decimal", "Decimal", "System.Decimal"],
        primitive(TypeCode::Double),
    );
    add(&["FTimespan", "Timespan", "TimeSpan", "System.TimeSpan"], primitive(TypeCode::Timespan));
    add(&["FDateTime", "DateTime", "System.DateTime"], primitive(TypeCode::DateTime));
    add(&["FString", "string", "String", "System.String"], primitive(TypeCode::String));
    add(&["FName", "Name"], primitive(TypeCode::Name));
    add(&["FText", "Text"], primitive(TypeCode::Text));
    add(
        &["UObject", "Object", "object", "System.Object"],
        primitive(TypeCode::ObjectPtr),
    );
    add(&["void", "Void", "System.Void"], primitive(TypeCode::Null));
    add(&["Type", "System.Type", "UClass"], ReflectedType::TypeObject);
    names
});

#[derive(Clone, Copy)]
enum ContainerKind {
    Array,
    Set,
    Map,
}

fn container_kind(name: &str) -> Option<ContainerKind> {
    match name {
        "Array" | "System.Array" | "TArray" | "List" | "System.Collections.Generic.List" => {
            Some(ContainerKind::Array)
        }
        "Set" | "TSet" | "HashSet" | "System.Collections.Generic.HashSet" => {
            Some(ContainerKind::Set)
        }
        "Map" | "TMap" | "Dictionary" | "System.Collections.Generic.Dictionary" => {
            Some(ContainerKind::Map)
        }
        _ => None,
    }
}

/// Resolves type names and reflected types to descriptors
pub struct TypeResolver {
    names: FxHashMap<String, ReflectedType>,
    parent: Option<Arc<TypeResolver>>,
    surrogates: Surrogates,
    cache: Arc<DescriptorCache>,
}

impl TypeResolver {
    pub fn builder() -> TypeResolverBuilder {
        TypeResolverBuilder::default()
    }

    /// Resolver knowing only the built-in primitive names
    pub fn builtin() -> Arc<TypeResolver> {
        Self::builder().build()
    }

    pub fn parent(&self) -> Option<&Arc<TypeResolver>> {
        self.parent.as_ref()
    }

    pub fn cache(&self) -> &Arc<DescriptorCache> {
        &self.cache
    }

    /// Resolve a symbolic reference to a descriptor
    pub fn resolve(&self, reference: &TypeReference) -> Option<TypeDescriptorRef> {
        let reflected = self.resolve_reflected(reference)?;
        Some(self.describe(&reflected))
    }

    /// Resolve a symbolic reference to its structural type
    pub fn resolve_reflected(&self, reference: &TypeReference) -> Option<ReflectedType> {
        let name = reference.full_name(false);
        if !reference.is_generic() {
            return self.lookup_name(name);
        }

        let arguments = reference
            .type_arguments()
            .iter()
            .map(|argument| self.resolve_reflected(argument))
            .collect::<Option<Vec<_>>>()?;
        match (container_kind(name)?, arguments.as_slice()) {
            (ContainerKind::Array, [element]) => Some(ReflectedType::array(element.clone())),
            (ContainerKind::Set, [element]) => Some(ReflectedType::set(element.clone())),
            (ContainerKind::Map, [key, value]) => {
                Some(ReflectedType::map(key.clone(), value.clone()))
            }
            _ => None,
        }
    }

    /// Whether `name` is a container name that needs generic arguments
    pub fn is_container_name(name: &str) -> bool {
        container_kind(name).is_some()
    }

    fn lookup_name(&self, name: &str) -> Option<ReflectedType> {
        if let Some(found) = self.names.get(name) {
            return Some(found.clone());
        }
        if let Some(found) = BUILTIN_NAMES.get(name) {
            return Some(found.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup_name(name),
            None => {
                trace!("type name '{name}' is not known");
                None
            }
        }
    }

    /// Descriptor of a structural type, created once per identity
    pub fn describe(&self, ty: &ReflectedType) -> TypeDescriptorRef {
        self.cache
            .get_or_insert_with(ty.identity(), || self.create_descriptor(ty))
    }

    /// Descriptor of the runtime type of `value`
    pub fn type_of(&self, value: &Value) -> TypeDescriptorRef {
        self.describe(&value.reflected_type())
    }

    fn create_descriptor(&self, ty: &ReflectedType) -> TypeDescriptorRef {
        match ty {
            ReflectedType::Primitive(code) => {
                Arc::new(PrimitiveType::new(*code, self.surrogates.get(code).cloned()))
            }
            ReflectedType::Object(class) | ReflectedType::Struct(class) => {
                Arc::new(ClassType::new(class.clone()))
            }
            ReflectedType::Enum(host) => {
                let underlying = self.describe(&ReflectedType::Primitive(host.underlying()));
                Arc::new(EnumType::new(host.clone(), underlying))
            }
            ReflectedType::Array(_) | ReflectedType::Set(_) | ReflectedType::Map(_, _) => {
                Arc::new(ContainerType::new(ty.clone()))
            }
            ReflectedType::TypeObject => Arc::new(UnknownType::type_object()),
        }
    }

    /// Names registered on this resolver and its parents, sorted
    pub fn known_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.known_type_names());
        }
        names.sort();
        names.dedup();
        names
    }
}

impl fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolver")
            .field("known_types", &self.names.len())
            .field("has_parent", &self.parent.is_some())
            .field("cached_descriptors", &self.cache.len())
            .finish()
    }
}

#[derive(Default)]
pub struct TypeResolverBuilder {
    names: FxHashMap<String, ReflectedType>,
    parent: Option<Arc<TypeResolver>>,
    surrogates: FxHashMap<TypeCode, ClassRef>,
}

impl TypeResolverBuilder {
    /// Register a class under its name and its prefixed name
    pub fn known_class(mut self, class: ClassRef) -> Self {
        let ty = ReflectedType::of_class(class.clone());
        self.names.insert(class.cpp_name(), ty.clone());
        self.names.insert(class.name().to_string(), ty);
        self
    }

    /// Register an enum under its name and its prefixed name
    pub fn known_enum(mut self, host: Arc<HostEnum>) -> Self {
        let ty = ReflectedType::Enum(host.clone());
        self.names.insert(host.cpp_name(), ty.clone());
        self.names.insert(host.name().to_string(), ty);
        self
    }

    /// Register any structural type under an explicit name
    pub fn known_type(mut self, name: impl Into<String>, ty: ReflectedType) -> Self {
        self.names.insert(name.into(), ty);
        self
    }

    /// Delegate unknown names to `parent` and share its descriptor cache
    pub fn parent(mut self, parent: Arc<TypeResolver>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Replace the surrogate class of a primitive type
    ///
    /// A resolver with its own surrogates cannot share descriptors with its
    /// parent and gets a fresh cache.
    pub fn surrogate(mut self, code: TypeCode, class: ClassRef) -> Self {
        self.surrogates.insert(code, class);
        self
    }

    pub fn build(self) -> Arc<TypeResolver> {
        let (surrogates, cache) = match &self.parent {
            Some(parent) if self.surrogates.is_empty() => {
                (parent.surrogates.clone(), parent.cache.clone())
            }
            Some(parent) => {
                let mut merged = (*parent.surrogates).clone();
                merged.extend(self.surrogates);
                (Arc::new(merged), Arc::new(DescriptorCache::new()))
            }
            None => {
                let mut merged = default_surrogates();
                merged.extend(self.surrogates);
                (Arc::new(merged), Arc::new(DescriptorCache::new()))
            }
        };
        Arc::new(TypeResolver {
            names: self.names,
            parent: self.parent,
            surrogates,
            cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynamicClass;
    use crate::types::TypeDescriptor;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(text: &str) -> TypeReference {
        TypeReference::parse(text).unwrap()
    }

    #[rstest]
    #[case("int32", "int32")]
    #[case("System.Int32", "int32")]
    #[case("byte", "uint8")]
    #[case("FString", "FString")]
    #[case("System.Object", "UObject")]
    #[case("Array<int32>", "TArray<int32>")]
    #[case("System.Collections.Generic.List<FName>", "TArray<FName>")]
    #[case("TSet<uint8>", "TSet<uint8>")]
    #[case("Dictionary<FString, int32>", "TMap<FString, int32>")]
    #[case("System.Type", "System.Type")]
    fn test_builtin_names(#[case] name: &str, #[case] expected: &str) {
        let resolver = TypeResolver::builtin();
        let descriptor = resolver.resolve(&parse(name)).unwrap();
        assert_eq!(descriptor.type_name(), expected);
    }

    #[rstest]
    #[case("Array<int32, int32>")]
    #[case("Map<int32>")]
    #[case("Unknown<int32>")]
    #[case("Widget")]
    fn test_unresolved(#[case] name: &str) {
        assert!(TypeResolver::builtin().resolve(&parse(name)).is_none());
    }

    #[test]
    fn test_parent_chain_shares_cache() {
        let widget = DynamicClass::builder("Widget").build();
        let root = TypeResolver::builder().known_class(widget).build();
        let child = TypeResolver::builder().parent(root.clone()).build();

        let from_child = child.resolve(&parse("UWidget")).unwrap();
        let from_root = root.resolve(&parse("Widget")).unwrap();
        assert!(Arc::ptr_eq(&from_child, &from_root));
        assert!(Arc::ptr_eq(child.cache(), root.cache()));
        assert_eq!(child.known_type_names(), vec!["UWidget", "Widget"]);
    }

    #[test]
    fn test_enum_underlying() {
        let host = Arc::new(HostEnum::new("Mode", TypeCode::UInt8).with_literal("Fast", 1));
        let resolver = TypeResolver::builder().known_enum(host).build();
        let descriptor = resolver.resolve(&parse("EMode")).unwrap();
        assert_eq!(descriptor.type_code(), TypeCode::Enum);
        assert_eq!(
            descriptor.underlying_type().map(|d| d.type_code()),
            Some(TypeCode::UInt8)
        );
        assert_eq!(descriptor.property_names(true), vec!["Fast"]);
    }

    #[test]
    fn test_surrogate_override_uses_own_cache() {
        let root = TypeResolver::builtin();
        let custom = DynamicClass::builder("CustomInt").build();
        let child = TypeResolver::builder()
            .parent(root.clone())
            .surrogate(TypeCode::Int32, custom)
            .build();
        assert!(!Arc::ptr_eq(child.cache(), root.cache()));
        let int32 = child.describe(&ReflectedType::Primitive(TypeCode::Int32));
        assert!(int32.function_names(false).is_empty());
    }
}
