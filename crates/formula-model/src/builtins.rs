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

//! Built-in surrogate library
//!
//! Surrogate classes give primitive types their members. Every function here is
//! static; the extension scan turns `Self`-first functions into instance members.

use std::sync::Arc;

use chrono::{Datelike, Local, TimeDelta, Timelike, Utc};
use formula_engine_core::TypeCode;
use rustc_hash::FxHashMap;

use crate::dynamic::{DynamicClass, DynamicClassBuilder, DynamicFunction};
use crate::extension::SELF_PARAMETER;
use crate::reflection::{ClassRef, FunctionRef, HostCall, ReflectedType};
use crate::value::Value;

type Body = fn(HostCall<'_>) -> Result<Value, String>;

fn self_function(name: &str, code: TypeCode, returns: TypeCode, body: Body) -> FunctionRef {
    DynamicFunction::builder(name)
        .static_function()
        .parameter(SELF_PARAMETER, code.into())
        .returns(returns.into())
        .build(body)
}

fn static_function(
    name: &str,
    parameters: &[(&str, TypeCode)],
    returns: TypeCode,
    body: Body,
) -> FunctionRef {
    let mut builder = DynamicFunction::builder(name)
        .static_function()
        .returns(returns.into());
    for (parameter, code) in parameters {
        builder = builder.parameter(*parameter, ReflectedType::Primitive(*code));
    }
    builder.build(body)
}

fn library(code: TypeCode) -> DynamicClassBuilder {
    let name = match code {
        TypeCode::String | TypeCode::Name | TypeCode::Text => "StringLibrary",
        TypeCode::Float | TypeCode::Double => "MathLibrary",
        TypeCode::Timespan => "TimespanLibrary",
        TypeCode::DateTime => "DateTimeLibrary",
        _ => "PrimitiveLibrary",
    };
    DynamicClass::builder(name).function(self_function(
        "ToString",
        code,
        TypeCode::String,
        |call| Ok(Value::string(call.argument(0)?.to_string())),
    ))
}

fn text(call: &HostCall<'_>, index: usize) -> Result<String, String> {
    call.argument(index)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("argument {index} is not a string"))
}

fn float(call: &HostCall<'_>, index: usize) -> Result<f64, String> {
    call.argument(index)?
        .as_f64()
        .ok_or_else(|| format!("argument {index} is not a number"))
}

fn timespan(call: &HostCall<'_>) -> Result<TimeDelta, String> {
    match call.argument(0)? {
        Value::Timespan(span) => Ok(*span),
        other => Err(format!("expected FTimespan, got {}", other.type_name())),
    }
}

fn datetime(call: &HostCall<'_>) -> Result<chrono::NaiveDateTime, String> {
    match call.argument(0)? {
        Value::DateTime(value) => Ok(*value),
        other => Err(format!("expected FDateTime, got {}", other.type_name())),
    }
}

fn floating_library(code: TypeCode) -> ClassRef {
    let value = [("Value", code)];
    library(code)
        .function(static_function("IsNaN", &value, TypeCode::Boolean, |call| {
            Ok(Value::Boolean(float(&call, 0)?.is_nan()))
        }))
        .function(static_function("IsFinite", &value, TypeCode::Boolean, |call| {
            Ok(Value::Boolean(float(&call, 0)?.is_finite()))
        }))
        .function(static_function(
            "IsNegativeInfinity",
            &value,
            TypeCode::Boolean,
            |call| Ok(Value::Boolean(float(&call, 0)? == f64::NEG_INFINITY)),
        ))
        .function(static_function(
            "IsPositiveInfinity",
            &value,
            TypeCode::Boolean,
            |call| Ok(Value::Boolean(float(&call, 0)? == f64::INFINITY)),
        ))
        .build()
}

fn string_library(code: TypeCode) -> ClassRef {
    library(code)
        .function(self_function("GetLength", code, TypeCode::Int32, |call| {
            let length = text(&call, 0)?.chars().count();
            i32::try_from(length)
                .map(Value::Int32)
                .map_err(|_| "string too long".to_string())
        }))
        .function(self_function("ToUpper", code, TypeCode::String, |call| {
            Ok(Value::string(text(&call, 0)?.to_uppercase()))
        }))
        .function(self_function("ToLower", code, TypeCode::String, |call| {
            Ok(Value::string(text(&call, 0)?.to_lowercase()))
        }))
        .function(self_function("Trim", code, TypeCode::String, |call| {
            Ok(Value::string(text(&call, 0)?.trim()))
        }))
        .function(string_predicate(code, "Contains", |s, part| s.contains(part)))
        .function(string_predicate(code, "StartsWith", |s, part| s.starts_with(part)))
        .function(string_predicate(code, "EndsWith", |s, part| s.ends_with(part)))
        .function(static_function(
            "IsNullOrEmpty",
            &[("Value", TypeCode::String)],
            TypeCode::Boolean,
            |call| Ok(Value::Boolean(text(&call, 0)?.is_empty())),
        ))
        .function(static_function(
            "Concat",
            &[("A", TypeCode::String), ("B", TypeCode::String)],
            TypeCode::String,
            |call| Ok(Value::string(text(&call, 0)? + &text(&call, 1)?)),
        ))
        .build()
}

fn string_predicate(code: TypeCode, name: &str, predicate: fn(&str, &str) -> bool) -> FunctionRef {
    DynamicFunction::builder(name)
        .static_function()
        .parameter(SELF_PARAMETER, code.into())
        .parameter("Value", TypeCode::String.into())
        .returns(TypeCode::Boolean.into())
        .build(move |call| Ok(Value::Boolean(predicate(&text(&call, 0)?, &text(&call, 1)?))))
}

fn timespan_library() -> ClassRef {
    let code = TypeCode::Timespan;
    library(code)
        .function(self_function("GetTotalMilliseconds", code, TypeCode::Double, |call| {
            Ok(Value::Double(timespan(&call)?.num_microseconds().unwrap_or(i64::MAX) as f64 / 1e3))
        }))
        .function(self_function("GetTotalSeconds", code, TypeCode::Double, |call| {
            Ok(Value::Double(timespan(&call)?.num_milliseconds() as f64 / 1e3))
        }))
        .function(self_function("GetTotalMinutes", code, TypeCode::Double, |call| {
            Ok(Value::Double(timespan(&call)?.num_milliseconds() as f64 / 60e3))
        }))
        .function(self_function("GetTotalHours", code, TypeCode::Double, |call| {
            Ok(Value::Double(timespan(&call)?.num_milliseconds() as f64 / 3_600e3))
        }))
        .function(self_function("GetTotalDays", code, TypeCode::Double, |call| {
            Ok(Value::Double(timespan(&call)?.num_milliseconds() as f64 / 86_400e3))
        }))
        .function(static_function(
            "FromSeconds",
            &[("Seconds", TypeCode::Double)],
            code,
            |call| {
                let seconds = float(&call, 0)?;
                if !seconds.is_finite() {
                    return Err("seconds must be finite".to_string());
                }
                Ok(Value::Timespan(TimeDelta::nanoseconds((seconds * 1e9) as i64)))
            },
        ))
        .build()
}

fn datetime_library() -> ClassRef {
    let code = TypeCode::DateTime;
    library(code)
        .function(self_function("GetYear", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.year()))
        }))
        .function(self_function("GetMonth", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.month() as i32))
        }))
        .function(self_function("GetDay", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.day() as i32))
        }))
        .function(self_function("GetHour", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.hour() as i32))
        }))
        .function(self_function("GetMinute", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.minute() as i32))
        }))
        .function(self_function("GetSecond", code, TypeCode::Int32, |call| {
            Ok(Value::Int32(datetime(&call)?.second() as i32))
        }))
        .function(static_function("Now", &[], code, |_| {
            Ok(Value::DateTime(Local::now().naive_local()))
        }))
        .function(static_function("UtcNow", &[], code, |_| {
            Ok(Value::DateTime(Utc::now().naive_utc()))
        }))
        .build()
}

/// Surrogate class for every primitive code
pub fn default_surrogates() -> FxHashMap<TypeCode, ClassRef> {
    let mut surrogates: FxHashMap<TypeCode, ClassRef> = FxHashMap::default();
    for code in TypeCode::PRIMITIVES {
        let surrogate: ClassRef = match code {
            TypeCode::Float | TypeCode::Double => floating_library(code),
            TypeCode::String | TypeCode::Name | TypeCode::Text => string_library(code),
            TypeCode::Timespan => timespan_library(),
            TypeCode::DateTime => datetime_library(),
            _ => library(code).build(),
        };
        surrogates.insert(code, surrogate);
    }
    surrogates
}

/// Shared handle to a surrogate table
pub type Surrogates = Arc<FxHashMap<TypeCode, ClassRef>>;
