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

//! Member access and name resolution
//!
//! A member node is resolved in three steps:
//!
//! 1. the chain to its left read as a type name, with a static property of
//!    that type (`UTestObject.Int32Prop`);
//! 2. an instance property on the runtime type of the evaluated target;
//! 3. for a bare name, the literals `true`/`false`/`null`, then the context
//!    arguments, then the properties of the global object.

use formula_engine_ast::MemberExpression;
use formula_engine_ast::notation::{FALSE_LITERAL, NULL_LITERAL, TRUE_LITERAL};
use formula_engine_core::{ErrorCode, FormulaError, Result};
use formula_engine_model::{TypeDescriptorRef, Value};

use crate::context::ExecutionContext;
use crate::engine::FormulaEngine;

impl FormulaEngine {
    pub(crate) fn evaluate_member(
        &self,
        member: &MemberExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let static_type = self.static_declaring_type(member, context);
        if let Some(property) = static_type
            .as_ref()
            .and_then(|descriptor| descriptor.try_get_property(member.name(), true))
        {
            return property.get_value(None);
        }

        let Some(target) = member.expression() else {
            return self.resolve_global_member(member, context);
        };

        let target = self
            .evaluate(target, context, None, depth)
            .map_err(|error| {
                static_member_error(error, static_type.as_ref(), member.name(), |descriptor| {
                    descriptor.property_names(true)
                })
            })?;
        if target.is_null() {
            return self.null_target(
                member.is_null_propagation_enabled() || context.auto_null_propagation(),
            );
        }

        let descriptor = context.resolver().type_of(&target);
        match descriptor.try_get_property(member.name(), false) {
            Some(property) => property.get_value(Some(&target)),
            None => Err(FormulaError::member_not_found(
                descriptor.type_name(),
                member.name(),
                &descriptor.property_names(false),
            )),
        }
    }

    /// Type named by the chain to the left of `member`, when it resolves
    pub(crate) fn static_declaring_type(
        &self,
        member: &MemberExpression,
        context: &ExecutionContext,
    ) -> Option<TypeDescriptorRef> {
        member
            .type_reference(true)
            .and_then(|reference| context.resolver().resolve(reference))
    }

    fn resolve_global_member(
        &self,
        member: &MemberExpression,
        context: &ExecutionContext,
    ) -> Result<Value> {
        match member.raw_name() {
            TRUE_LITERAL => return Ok(Value::Boolean(true)),
            FALSE_LITERAL => return Ok(Value::Boolean(false)),
            NULL_LITERAL => return Ok(Value::Null),
            _ => {}
        }

        if let Some(value) = context
            .argument(member.name())
            .or_else(|| context.argument(member.raw_name()))
        {
            return Ok(value);
        }

        let global = context.global();
        let mut candidates = context.argument_names();
        if !global.is_null() {
            let descriptor = context.resolver().type_of(global);
            if let Some(property) = descriptor.try_get_property(member.name(), false) {
                return property.get_value(Some(global));
            }
            candidates.extend(descriptor.property_names(false));
        }

        candidates.sort();
        candidates.dedup();
        Err(FormulaError::unable_to_resolve_global(member.name(), &candidates))
    }
}

/// A target that failed to resolve as a global names a type without the
/// requested static member
pub(crate) fn static_member_error(
    error: FormulaError,
    static_type: Option<&TypeDescriptorRef>,
    member_name: &str,
    available: impl Fn(&TypeDescriptorRef) -> Vec<String>,
) -> FormulaError {
    match static_type {
        Some(descriptor) if error.code() == ErrorCode::TypeUnableToResolveGlobal => {
            FormulaError::static_member_not_found(
                descriptor.type_name(),
                member_name,
                &available(descriptor),
            )
        }
        _ => error,
    }
}
