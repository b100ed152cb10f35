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

//! Member and element bindings of initializer expressions

use crate::expression::ExpressionRef;
use crate::notation;

/// One `Member = ...` entry of a member initializer
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    raw_name: String,
    name: String,
    pub kind: MemberBindingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberBindingKind {
    /// `Member = expression`
    Assignment(ExpressionRef),
    /// `Member = { Inner = ... }`, applied to the member's current value
    MemberMember(Vec<MemberBinding>),
    /// `Member = { a, b }`, appended to the member's collection
    List(Vec<ElementInit>),
}

impl MemberBinding {
    pub fn new(raw_name: impl Into<String>, kind: MemberBindingKind) -> Self {
        let raw_name = raw_name.into();
        Self {
            name: notation::member_name(&raw_name).to_string(),
            raw_name,
            kind,
        }
    }

    pub fn assignment(raw_name: impl Into<String>, expression: ExpressionRef) -> Self {
        Self::new(raw_name, MemberBindingKind::Assignment(expression))
    }

    pub fn member(raw_name: impl Into<String>, bindings: Vec<MemberBinding>) -> Self {
        Self::new(raw_name, MemberBindingKind::MemberMember(bindings))
    }

    pub fn list(raw_name: impl Into<String>, initializers: Vec<ElementInit>) -> Self {
        Self::new(raw_name, MemberBindingKind::List(initializers))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// A binding with an empty member name cannot be applied
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
            && match &self.kind {
                MemberBindingKind::MemberMember(bindings) => bindings.iter().all(Self::is_valid),
                MemberBindingKind::Assignment(_) | MemberBindingKind::List(_) => true,
            }
    }
}

/// Values added to a collection in one step
///
/// Arrays and sets take one value per element initializer, maps take a key
/// and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub initializers: Vec<ExpressionRef>,
}

impl ElementInit {
    pub fn new(initializers: Vec<ExpressionRef>) -> Self {
        Self { initializers }
    }

    pub fn single(value: ExpressionRef) -> Self {
        Self {
            initializers: vec![value],
        }
    }

    pub fn pair(key: ExpressionRef, value: ExpressionRef) -> Self {
        Self {
            initializers: vec![key, value],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;

    #[test]
    fn test_binding_validity() {
        let value = Expression::name("x");
        assert!(MemberBinding::assignment("@Int32Prop", value.clone()).is_valid());
        assert!(!MemberBinding::assignment("", value.clone()).is_valid());
        assert!(
            !MemberBinding::member("Outer", vec![MemberBinding::assignment("@", value)])
                .is_valid()
        );
    }
}
