//! Applicant record and its encoding into the model's columns

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::TreeEnsemble;

/// One credit-card application as posted by the form
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApplicantRecord {
    #[serde(rename = "Annual_income", deserialize_with = "number")]
    pub annual_income: f64,
    #[serde(rename = "Employed_days", deserialize_with = "number")]
    pub employed_days: f64,
    #[serde(rename = "Family_Members", deserialize_with = "number")]
    pub family_members: f64,
    #[serde(rename = "Birthday_count", deserialize_with = "number")]
    pub birthday_count: f64,
    #[serde(rename = "Type_Income", deserialize_with = "category")]
    pub type_income: String,
    #[serde(rename = "Housing_type", deserialize_with = "category")]
    pub housing_type: String,
    #[serde(rename = "Type_Occupation", deserialize_with = "category")]
    pub type_occupation: String,
    #[serde(rename = "EDUCATION", deserialize_with = "category")]
    pub education: String,
}

impl ApplicantRecord {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::invalid_input(format!("Invalid input: {}", e)))
    }

    /// Age in days counted backwards from today, as in the training data
    pub fn normalized_birthday_count(&self) -> f64 {
        if self.birthday_count > 0.0 {
            -self.birthday_count
        } else {
            self.birthday_count
        }
    }

    fn numeric(&self) -> [(&'static str, f64); 4] {
        [
            ("Annual_income", self.annual_income),
            ("Employed_days", self.employed_days),
            ("Family_Members", self.family_members),
            ("Birthday_count", self.normalized_birthday_count()),
        ]
    }

    fn categorical(&self) -> [(&'static str, &str); 4] {
        [
            ("Type_Income", &self.type_income),
            ("Housing_type", &self.housing_type),
            ("Type_Occupation", &self.type_occupation),
            ("EDUCATION", &self.education),
        ]
    }

    /// Feature vector in the model's column order.
    ///
    /// Unknown categories leave every one-hot column of that field at zero.
    pub fn encode(&self, model: &TreeEnsemble) -> Vec<f64> {
        let mut features = vec![0.0; model.n_features()];

        for (name, value) in self.numeric() {
            if let Some(i) = model.feature_index(name) {
                features[i] = value;
            }
        }

        for (field, value) in self.categorical() {
            let column = format!("{}_{}", field, value);
            match model.feature_index(&column) {
                Some(i) => features[i] = 1.0,
                None => tracing::debug!("No column {} in model", column),
            }
        }

        features
    }
}

fn number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| de::Error::custom(format!("not a number: {:?}", s))),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

fn category<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn model() -> TreeEnsemble {
        TreeEnsemble::from_json(
            r#"{
            "feature_names": ["Annual_income", "Birthday_count", "EDUCATION_Higher education",
                              "Housing_type_House / apartment", "Type_Income_Pensioner"],
            "classes": [0, 1],
            "trees": [{"nodes": [{"value": [1.0, 1.0]}]}]
        }"#,
        )
        .unwrap()
    }

    fn applicant() -> Value {
        json!({
            "Annual_income": "180000",
            "Employed_days": 1200,
            "Family_Members": "2",
            "Birthday_count": 12000,
            "Type_Income": "Working",
            "Housing_type": "House / apartment",
            "Type_Occupation": "Laborers",
            "EDUCATION": "Higher education"
        })
    }

    #[test]
    fn test_encode_numeric_and_one_hot() {
        let record = ApplicantRecord::from_value(applicant()).unwrap();
        let features = record.encode(&model());
        assert_eq!(features, vec![180000.0, -12000.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_rejects_non_numeric_income() {
        let mut value = applicant();
        value["Annual_income"] = json!("banyak");
        assert!(matches!(
            ApplicantRecord::from_value(value),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_field_is_invalid() {
        let mut value = applicant();
        value.as_object_mut().unwrap().remove("EDUCATION");
        assert!(ApplicantRecord::from_value(value).is_err());
    }

    proptest! {
        #[test]
        fn prop_birthday_count_is_never_positive(days in -40000i64..40000) {
            let mut value = applicant();
            value["Birthday_count"] = json!(days);
            let record = ApplicantRecord::from_value(value).unwrap();
            prop_assert!(record.normalized_birthday_count() <= 0.0);
            prop_assert_eq!(record.normalized_birthday_count().abs(), days.abs() as f64);
        }
    }
}
