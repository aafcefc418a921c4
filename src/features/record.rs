//! Raw records as seen by the encoder, and the request input contract.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::columns::{
    AGE, GENDER, MANDATORY_FIELDS, PRIMARY_SYMPTOM_DURATION, SYMPTOM_COLUMNS, is_symptom,
};
use crate::error::RecordError;

/// A single cell before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Anything the encoder can read column values from.
pub trait RawRecord {
    /// Value for `column`, or `None` when the record has no such field.
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>>;
}

/// Validated symptom-checker input.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomRecord {
    pub age: u32,
    pub gender: String,
    pub primary_symptom_duration: String,
    /// One entry per known symptom column; absent symptoms are `0`.
    pub symptoms: BTreeMap<String, u8>,
}

impl SymptomRecord {
    /// Record with every symptom flag cleared.
    pub fn new(age: u32, gender: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            age,
            gender: gender.into(),
            primary_symptom_duration: duration.into(),
            symptoms: SYMPTOM_COLUMNS
                .iter()
                .map(|name| ((*name).to_string(), 0))
                .collect(),
        }
    }

    /// Set a symptom flag. Unknown symptom names are ignored.
    pub fn with_symptom(mut self, name: &str, present: bool) -> Self {
        if let Some(flag) = self.symptoms.get_mut(name) {
            *flag = u8::from(present);
        }
        self
    }

    /// Parse a request body, checking mandatory fields and symptom flag values.
    ///
    /// Keys outside the known vocabulary are ignored.
    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;
        let missing: Vec<String> = MANDATORY_FIELDS
            .iter()
            .filter(|field| object.get(**field).is_none_or(Value::is_null))
            .map(|field| (*field).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RecordError::MissingFields(missing));
        }

        let age = parse_age(&object[AGE])?;
        let gender = parse_category(object, GENDER)?;
        let duration = parse_category(object, PRIMARY_SYMPTOM_DURATION)?;
        let mut record = Self::new(age, gender, duration);
        for (name, flag) in record.symptoms.iter_mut() {
            if let Some(value) = object.get(name) {
                *flag = parse_flag(name, value)?;
            }
        }
        Ok(record)
    }
}

impl RawRecord for SymptomRecord {
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
        match column {
            AGE => Some(RawValue::Number(f64::from(self.age))),
            GENDER => Some(RawValue::Text(&self.gender)),
            PRIMARY_SYMPTOM_DURATION => Some(RawValue::Text(&self.primary_symptom_duration)),
            other if is_symptom(other) => self
                .symptoms
                .get(other)
                .map(|flag| RawValue::Number(f64::from(*flag))),
            _ => None,
        }
    }
}

fn parse_age(value: &Value) -> Result<u32, RecordError> {
    let parsed = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed.and_then(|age| u32::try_from(age).ok()) {
        Some(age) if age > 0 => Ok(age),
        _ => Err(RecordError::InvalidField {
            field: AGE.to_string(),
            reason: format!("expected a positive integer, got {value}"),
        }),
    }
}

fn parse_category(object: &Map<String, Value>, field: &str) -> Result<String, RecordError> {
    let text = match &object[field] {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        other => {
            return Err(RecordError::InvalidField {
                field: field.to_string(),
                reason: format!("expected a string, got {other}"),
            });
        }
    };
    if text.is_empty() {
        return Err(RecordError::InvalidField {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(text)
}

fn parse_flag(field: &str, value: &Value) -> Result<u8, RecordError> {
    let flag = match value {
        Value::Null => Some(0),
        Value::Bool(present) => Some(u8::from(*present)),
        Value::Number(number) => match number.as_f64() {
            Some(v) if v == 0.0 => Some(0),
            Some(v) if v == 1.0 => Some(1),
            _ => None,
        },
        Value::String(text) => match text.trim() {
            "0" | "" => Some(0),
            "1" => Some(1),
            _ => None,
        },
        _ => None,
    };
    flag.ok_or_else(|| RecordError::InvalidField {
        field: field.to_string(),
        reason: format!("expected 0 or 1, got {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_symptoms_default_to_zero() {
        let record = SymptomRecord::from_json(&json!({
            "age": 30,
            "gender": "Male",
            "primary_symptom_duration": "3-7 days",
            "fever": 1,
            "cough": "1",
            "headache": false,
        }))
        .unwrap();
        assert_eq!(record.age, 30);
        assert_eq!(record.symptoms["fever"], 1);
        assert_eq!(record.symptoms["cough"], 1);
        assert_eq!(record.symptoms["headache"], 0);
        assert_eq!(record.symptoms["rash"], 0);
        assert_eq!(record.symptoms.len(), SYMPTOM_COLUMNS.len());
    }

    #[test]
    fn reports_every_missing_mandatory_field() {
        let err = SymptomRecord::from_json(&json!({ "gender": "Female" })).unwrap_err();
        match err {
            RecordError::MissingFields(fields) => {
                assert_eq!(fields, vec!["age", "primary_symptom_duration"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_positive_age() {
        let err = SymptomRecord::from_json(&json!({
            "age": 0,
            "gender": "Male",
            "primary_symptom_duration": "1-2 days",
        }))
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { ref field, .. } if field == "age"));
    }

    #[test]
    fn rejects_non_binary_symptom() {
        let err = SymptomRecord::from_json(&json!({
            "age": "41",
            "gender": "Male",
            "primary_symptom_duration": "1-2 days",
            "fever": 3,
        }))
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { ref field, .. } if field == "fever"));
    }

    #[test]
    fn ignores_unknown_keys_and_rejects_non_objects() {
        let record = SymptomRecord::from_json(&json!({
            "age": 52,
            "gender": "Female",
            "primary_symptom_duration": "> 2 weeks",
            "favourite_colour": "blue",
        }))
        .unwrap();
        assert_eq!(record.raw_value("favourite_colour"), None);
        assert!(matches!(
            SymptomRecord::from_json(&json!([1, 2])),
            Err(RecordError::NotAnObject)
        ));
    }

    #[test]
    fn exposes_raw_values_by_column() {
        let record = SymptomRecord::new(30, "Male", "3-7 days").with_symptom("fever", true);
        assert_eq!(record.raw_value("age"), Some(RawValue::Number(30.0)));
        assert_eq!(record.raw_value("gender"), Some(RawValue::Text("Male")));
        assert_eq!(record.raw_value("fever"), Some(RawValue::Number(1.0)));
        assert_eq!(record.raw_value("cough"), Some(RawValue::Number(0.0)));
    }
}
