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

//! Shared helpers for the integration tests

#![allow(dead_code)]

use formula_engine::model::testing;
use formula_engine::{ExecutionContext, FormulaEngine, Result, Value, from_json_str};

/// Context over a fresh fixture object
pub fn fixture_context() -> ExecutionContext {
    ExecutionContext::builder()
        .global(testing::new_test_object())
        .resolver(testing::resolver())
        .build()
}

/// Evaluate a JSON document
pub fn run(document: &str, context: &ExecutionContext) -> Result<Value> {
    let expression = from_json_str(document)?;
    FormulaEngine::new().execute(&expression, context, None)
}
