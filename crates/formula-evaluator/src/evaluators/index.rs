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

//! Indexer evaluation over arrays, sets and maps

use formula_engine_ast::IndexExpression;
use formula_engine_core::{FormulaError, Result};
use formula_engine_model::{StructValue, Value};

use crate::context::ExecutionContext;
use crate::engine::FormulaEngine;

impl FormulaEngine {
    pub(crate) fn evaluate_index(
        &self,
        index: &IndexExpression,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<Value> {
        let target = self.evaluate(&index.expression, context, None, depth)?;
        if target.is_null() {
            return self.null_target(
                index.use_null_propagation
                    || index.expression.is_null_propagation_enabled()
                    || context.auto_null_propagation(),
            );
        }

        let arguments = index
            .arguments
            .values()
            .map(|argument| self.evaluate(argument, context, None, depth))
            .collect::<Result<Vec<_>>>()?;
        let not_found = || {
            let types: Vec<String> = arguments.iter().map(Value::type_name).collect();
            FormulaError::indexer_not_found(target.type_name(), &types)
        };

        match (target.as_struct(), arguments.as_slice()) {
            (Some(StructValue::Map { key, .. }), [argument]) => {
                let lookup = argument.try_copy_into(key).ok_or_else(|| {
                    FormulaError::invalid_map_key(
                        argument.to_string(),
                        argument.type_name(),
                        key.cpp_type(),
                    )
                })?;
                target
                    .as_struct()
                    .and_then(|map| map.find_key(&lookup))
                    .cloned()
                    .ok_or_else(|| FormulaError::key_not_found(lookup.to_string(), lookup.type_name()))
            }
            (Some(sequence @ (StructValue::Array { .. } | StructValue::Set { .. })), [argument])
                if argument.type_code().is_integral() =>
            {
                let position = argument.as_i128().ok_or_else(not_found)?;
                usize::try_from(position)
                    .ok()
                    .and_then(|position| sequence.get_by_index(position))
                    .cloned()
                    .ok_or_else(|| {
                        FormulaError::index_out_of_bounds(
                            i64::try_from(position).unwrap_or(i64::MAX),
                            sequence.len(),
                        )
                    })
            }
            _ => Err(not_found()),
        }
    }
}
