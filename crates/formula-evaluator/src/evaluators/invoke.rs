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

//! Function invocation

use formula_engine_ast::{Expression, InvokeExpression, MemberExpression};
use formula_engine_core::{FormulaError, Result};
use formula_engine_model::{InvokeArguments, MethodGroup, ReflectedType, Value};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::engine::FormulaEngine;
use crate::evaluators::member::static_member_error;

/// Function called when the callee is not a member access
const INVOKE_FUNCTION_NAME: &str = "Invoke";

impl FormulaEngine {
    pub(crate) fn evaluate_invoke(
        &self,
        invoke: &InvokeExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let Expression::Member(member) = invoke.expression.as_ref() else {
            return self.invoke_callable(invoke, context, depth);
        };

        let type_arguments = member
            .type_arguments()
            .iter()
            .map(|reference| self.resolve_reflected(reference, context))
            .collect::<Result<Vec<_>>>()?;

        let static_type = self.static_declaring_type(member, context);
        if let Some(group) = static_type
            .as_ref()
            .and_then(|descriptor| descriptor.try_get_function(member.name(), true))
        {
            return self.call(&group, None, invoke, &type_arguments, context, depth);
        }

        let Some(target) = member.expression() else {
            return self.invoke_global(member, invoke, &type_arguments, context, depth);
        };

        let target = self
            .evaluate(target, context, None, depth)
            .map_err(|error| {
                static_member_error(error, static_type.as_ref(), member.name(), |descriptor| {
                    descriptor.function_names(true)
                })
            })?;
        if target.is_null() {
            return self.null_target(
                member.is_null_propagation_enabled() || context.auto_null_propagation(),
            );
        }

        let descriptor = context.resolver().type_of(&target);
        if let Some(group) = descriptor.try_get_function(member.name(), false) {
            return self.call(&group, Some(&target), invoke, &type_arguments, context, depth);
        }
        if let Some(group) = descriptor.try_get_function(member.name(), true) {
            return self.call(&group, None, invoke, &type_arguments, context, depth);
        }
        Err(FormulaError::member_not_found(
            descriptor.type_name(),
            member.name(),
            &descriptor.function_names(false),
        ))
    }

    /// A bare function name: instance then static functions of the global
    fn invoke_global(
        &self,
        member: &MemberExpression,
        invoke: &InvokeExpression,
        type_arguments: &[ReflectedType],
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let global = context.global();
        let mut candidates = context.argument_names();
        if !global.is_null() {
            let descriptor = context.resolver().type_of(global);
            if let Some(group) = descriptor.try_get_function(member.name(), false) {
                return self.call(&group, Some(global), invoke, type_arguments, context, depth);
            }
            if let Some(group) = descriptor.try_get_function(member.name(), true) {
                return self.call(&group, None, invoke, type_arguments, context, depth);
            }
            candidates.extend(descriptor.function_names(false));
            candidates.extend(descriptor.function_names(true));
        }

        candidates.sort();
        candidates.dedup();
        Err(FormulaError::unable_to_resolve_global(member.name(), &candidates))
    }

    /// Any other callee is evaluated and its `Invoke` function called
    fn invoke_callable(
        &self,
        invoke: &InvokeExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let callee = self.evaluate(&invoke.expression, context, None, depth)?;
        if callee.is_null() {
            return self.null_target(
                invoke.expression.is_null_propagation_enabled() || context.auto_null_propagation(),
            );
        }

        let descriptor = context.resolver().type_of(&callee);
        let group = descriptor
            .try_get_function(INVOKE_FUNCTION_NAME, false)
            .ok_or_else(|| {
                FormulaError::member_not_found(
                    descriptor.type_name(),
                    INVOKE_FUNCTION_NAME,
                    &descriptor.function_names(false),
                )
            })?;
        self.call(&group, Some(&callee), invoke, &[], context, depth)
    }

    /// Evaluate the arguments, call the group and write output parameters back
    fn call(
        &self,
        group: &MethodGroup,
        target: Option<&Value>,
        invoke: &InvokeExpression,
        type_arguments: &[ReflectedType],
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let mut arguments = InvokeArguments::new();
        for (key, expression) in &invoke.arguments {
            arguments.insert(key.clone(), self.evaluate(expression, context, None, depth)?);
        }

        let result = group.invoke(target, &mut arguments, type_arguments)?;

        for (key, value) in arguments.updated() {
            let Some(Expression::Member(argument)) = invoke.arguments.get(key).map(|e| e.as_ref())
            else {
                continue;
            };
            if argument.expression().is_none() {
                trace!(argument = argument.name(), ?value, "output parameter written back");
                context.update_argument(argument.name(), value.clone());
            }
        }
        Ok(result)
    }
}
