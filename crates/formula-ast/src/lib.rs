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

//! Expression tree of serialized formulas
//!
//! Formulas arrive as JSON documents describing a C#-like expression tree.
//! [`from_json`] reads them into [`Expression`] nodes shared through
//! [`ExpressionRef`]; every node renders back to C#-like text through
//! `Display`.
//!
//! ```
//! use formula_engine_ast::from_json;
//! use serde_json::json;
//!
//! let expression = from_json(&json!({
//!     "expressionType": "Add",
//!     "left": {"expressionType": "PropertyOrField", "name": "Int32Prop"},
//!     "right": {"expressionType": "Constant", "value": 1, "type": "int32"}
//! }))
//! .unwrap();
//! assert_eq!(expression.to_string(), "(Int32Prop + 1)");
//! ```

pub mod binding;
pub mod display;
pub mod expression;
pub mod json;
pub mod notation;

pub use binding::{ElementInit, MemberBinding, MemberBindingKind};
pub use expression::{
    Arguments, BinaryExpression, ConditionExpression, ConstantExpression, ConstantLiteral,
    ConversionKind, ConvertExpression, DefaultExpression, Expression, ExpressionRef,
    ExpressionType, IndexExpression, InvokeExpression, LambdaExpression, ListInitExpression,
    MemberExpression, MemberInitExpression, NewArrayBoundsExpression, NewArrayInitExpression,
    NewExpression, TypeIsExpression, TypeOfExpression, UnaryExpression, positional_arguments,
};
pub use json::{from_json, from_json_str, read_type_reference};
