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

//! Values, host reflection and type descriptors for the formula expression engine
//!
//! This crate provides the runtime [`Value`] representation, the reflection
//! traits a host implements to expose its object graph ([`HostClass`],
//! [`HostProperty`], [`HostFunction`], [`HostObject`]), and the
//! [`TypeDescriptor`]s the evaluator uses for member lookup, coercion and
//! operator dispatch.
//!
//! ## Type resolution
//!
//! A [`TypeResolver`] maps symbolic type names to descriptors. Descriptors are
//! created lazily and cached by type identity in a [`DescriptorCache`] shared by
//! a resolver and its children, so repeated lookups return the same `Arc`.
//!
//! ```
//! use formula_engine_model::{TypeDescriptor, TypeResolver, Value};
//!
//! let resolver = TypeResolver::builtin();
//! let descriptor = resolver.type_of(&Value::string("abc"));
//! assert_eq!(descriptor.type_name(), "FString");
//! assert!(descriptor.try_get_property("Length", false).is_some());
//! ```

pub mod builtins;
pub mod cache;
pub mod coercion;
pub mod containers;
pub mod dynamic;
pub mod extension;
pub mod members;
pub mod reflection;
pub mod resolver;
pub mod testing;
pub mod types;
pub mod value;

// Re-export main types
pub use cache::{CacheStats, DescriptorCache};
pub use dynamic::{DynamicClass, DynamicFunction, DynamicObject};
pub use members::{FormulaFunction, FormulaProperty, InvokeArguments, MethodGroup};
pub use reflection::{
    ClassKind, ClassRef, FunctionRef, HostCall, HostClass, HostEnum, HostFunction, HostObject,
    HostParameter, HostProperty, ObjectRef, PropertyRef, ReflectedType, TypeIdentity,
};
pub use resolver::{TypeResolver, TypeResolverBuilder};
pub use types::{TypeDescriptor, TypeDescriptorRef};
pub use value::{EnumValue, StructValue, Value};
