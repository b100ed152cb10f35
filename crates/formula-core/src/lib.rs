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

//! Core types for the formula expression engine
//!
//! This crate holds the vocabulary shared by every other crate in the workspace:
//! error codes and the [`FormulaError`] type, primitive [`TypeCode`]s, operator
//! kinds and symbolic [`TypeReference`]s.

pub mod error;
pub mod error_code;
pub mod operation;
pub mod type_code;
pub mod type_reference;

pub use error::{FormulaError, Result};
pub use error_code::{ErrorCategory, ErrorCode};
pub use operation::{BinaryOperation, CONVERSION_FUNCTION_NAMES, UnaryOperation};
pub use type_code::TypeCode;
pub use type_reference::TypeReference;
