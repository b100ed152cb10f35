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

//! Conversions between runtime values and plain JSON

use formula_engine_model::{StructValue, Value};
use serde_json::{Map, Number, Value as Json, json};

/// Value of a JSON scalar
///
/// Integers become `int32` when they fit, then `int64`, then `uint64`;
/// other numbers become `double`. Arrays and objects have no value form.
pub fn value_from_json(json: &Json) -> Option<Value> {
    match json {
        Json::Null => Some(Value::Null),
        Json::Bool(value) => Some(Value::Boolean(*value)),
        Json::Number(number) => Some(number_value(number)),
        Json::String(text) => Some(Value::string(text)),
        Json::Array(_) | Json::Object(_) => None,
    }
}

fn number_value(number: &Number) -> Value {
    if let Some(value) = number.as_i64() {
        return i32::try_from(value)
            .map(Value::Int32)
            .unwrap_or(Value::Int64(value));
    }
    match number.as_u64() {
        Some(value) => Value::UInt64(value),
        None => Value::Double(number.as_f64().unwrap_or(f64::NAN)),
    }
}

/// JSON rendering of a value
///
/// Objects render as their type name, enums as their literal name when the
/// value has one, and times through their display form.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(value) => json!(value),
        Value::UInt8(value) => json!(value),
        Value::UInt16(value) => json!(value),
        Value::UInt32(value) => json!(value),
        Value::UInt64(value) => json!(value),
        Value::Int8(value) => json!(value),
        Value::Int16(value) => json!(value),
        Value::Int32(value) => json!(value),
        Value::Int64(value) => json!(value),
        Value::Float(value) => float_json(f64::from(*value)),
        Value::Double(value) => float_json(*value),
        Value::String(text) | Value::Name(text) | Value::Text(text) => json!(text.as_ref()),
        Value::Timespan(_) | Value::DateTime(_) | Value::Object(_) => json!(value.to_string()),
        Value::Enum(value) => match value.ty.literal_name(value.value) {
            Some(name) => json!(name),
            None => json!(value.value),
        },
        Value::Struct(structure) => struct_json(structure),
    }
}

fn float_json(value: f64) -> Json {
    Number::from_f64(value).map_or_else(|| json!(value.to_string()), Json::Number)
}

fn struct_json(structure: &StructValue) -> Json {
    match structure {
        StructValue::Record { fields, .. } => Json::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), value_to_json(field)))
                .collect::<Map<_, _>>(),
        ),
        StructValue::Array { items, .. } | StructValue::Set { items, .. } => {
            Json::Array(items.iter().map(value_to_json).collect())
        }
        StructValue::Map { entries, .. } => {
            let keyed = entries
                .iter()
                .map(|(key, value)| (key.to_string(), value_to_json(value)))
                .collect::<Map<_, _>>();
            Json::Object(keyed)
        }
        StructValue::Type(descriptor) => json!(descriptor.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_engine_core::TypeCode;
    use formula_engine_model::testing;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(json!(7), Value::Int32(7))]
    #[case(json!(5_000_000_000i64), Value::Int64(5_000_000_000))]
    #[case(json!(u64::MAX), Value::UInt64(u64::MAX))]
    #[case(json!(1.5), Value::Double(1.5))]
    #[case(json!("text"), Value::string("text"))]
    #[case(json!(true), Value::Boolean(true))]
    #[case(Json::Null, Value::Null)]
    fn test_scalars(#[case] json: Json, #[case] expected: Value) {
        assert_eq!(value_from_json(&json), Some(expected));
    }

    #[test]
    fn test_composites_have_no_value() {
        assert_eq!(value_from_json(&json!([1])), None);
        assert_eq!(value_from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_rendering() {
        let array = Value::Struct(StructValue::Array {
            element: TypeCode::Int32.into(),
            items: vec![Value::Int32(1), Value::Int32(2)],
        });
        assert_eq!(value_to_json(&array), json!([1, 2]));

        let record = testing::new_test_struct(3, "three");
        assert_eq!(
            value_to_json(&record),
            json!({"Int32Field": 3, "StringField": "three"})
        );

        let format = formula_engine_model::EnumValue::new(testing::game_data_format(), 1);
        assert_eq!(value_to_json(&Value::Enum(format)), json!("MessagePack"));
    }
}
