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

//! Per-node evaluators
//!
//! Each module adds the evaluation of one family of expression nodes to
//! [`FormulaEngine`](crate::FormulaEngine). Native operator semantics live in
//! [`native`] so hosts can reuse them outside a tree walk.

mod binary;
mod constant;
mod construction;
mod conversion;
mod index;
mod invoke;
mod member;
pub mod native;
mod unary;

pub use native::NativeOperators;
