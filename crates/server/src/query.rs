//! Inbound query shape and its validated form.
//!
//! `QueryInput` is what arrives from the outside (CLI flags, a JSON body).
//! Every field is optional at this stage so that missing values surface as
//! field-level validation errors rather than deserialization failures.
//! `CropQuery` is the immutable, validated request the engine works on.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of the pH scale
pub const MAX_PH: f64 = 14.0;

/// Raw inbound query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(default)]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    pub phosphorus: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
    #[serde(default, alias = "acidity")]
    pub ph: Option<f64>,
    #[serde(default)]
    pub rainfall: Option<f64>,
    #[serde(default, alias = "city")]
    pub location: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// A query was rejected before any weather call or inference
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid query: {}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Error for a single field
    pub fn for_field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    /// Whether `field` is among the rejected fields
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

/// Collects field errors while a query is being checked
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Required value within `[min, max]`; returns 0.0 after a rejection
    fn bounded(&mut self, field: &'static str, value: Option<f64>, min: f64, max: f64) -> f64 {
        match value {
            None => {
                self.reject(field, "is required");
                0.0
            }
            Some(v) => self.check_range(field, v, min, max),
        }
    }

    fn optional(
        &mut self,
        field: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        value.map(|v| self.check_range(field, v, min, max))
    }

    fn check_range(&mut self, field: &'static str, value: f64, min: f64, max: f64) -> f64 {
        if !value.is_finite() {
            self.reject(field, "must be a finite number");
        } else if value < min {
            self.reject(field, format!("must be at least {}", min));
        } else if value > max {
            self.reject(field, format!("must be at most {}", max));
        }
        value
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError {
                fields: self.errors,
            })
        }
    }
}

impl QueryInput {
    /// Check every field and build a `CropQuery`.
    ///
    /// All violations are reported together, in field order.
    pub fn validate(self) -> Result<CropQuery, ValidationError> {
        let mut checker = Checker::default();

        let nitrogen = checker.bounded("nitrogen", self.nitrogen, 0.0, f64::MAX);
        let phosphorus = checker.bounded("phosphorus", self.phosphorus, 0.0, f64::MAX);
        let potassium = checker.bounded("potassium", self.potassium, 0.0, f64::MAX);
        let ph = checker.bounded("ph", self.ph, 0.0, MAX_PH);
        let rainfall = checker.bounded("rainfall", self.rainfall, 0.0, f64::MAX);

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if location.is_empty() {
            checker.reject("location", "must not be empty");
        }

        let temperature = checker.optional("temperature", self.temperature, f64::MIN, f64::MAX);
        let humidity = checker.optional("humidity", self.humidity, 0.0, 100.0);

        checker.finish(CropQuery {
            nitrogen,
            phosphorus,
            potassium,
            ph,
            rainfall,
            location,
            temperature,
            humidity,
        })
    }
}

/// A validated recommendation request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropQuery {
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    ph: f64,
    rainfall: f64,
    location: String,
    temperature: Option<f64>,
    humidity: Option<f64>,
}

impl CropQuery {
    /// Validate soil readings for a location (no manual weather).
    pub fn new(
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        ph: f64,
        rainfall: f64,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        QueryInput {
            nitrogen: Some(nitrogen),
            phosphorus: Some(phosphorus),
            potassium: Some(potassium),
            ph: Some(ph),
            rainfall: Some(rainfall),
            location: Some(location.into()),
            temperature: None,
            humidity: None,
        }
        .validate()
    }

    /// Same query with manually supplied conditions, re-validated.
    pub fn with_conditions(
        &self,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> Result<Self, ValidationError> {
        QueryInput {
            temperature,
            humidity,
            ..QueryInput::from(self)
        }
        .validate()
    }

    pub fn nitrogen(&self) -> f64 {
        self.nitrogen
    }

    pub fn phosphorus(&self) -> f64 {
        self.phosphorus
    }

    pub fn potassium(&self) -> f64 {
        self.potassium
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    pub fn rainfall(&self) -> f64 {
        self.rainfall
    }

    /// Location with surrounding whitespace removed
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Manual temperature, used only when live weather is bypassed
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Manual humidity, used only when live weather is bypassed
    pub fn humidity(&self) -> Option<f64> {
        self.humidity
    }
}

impl From<&CropQuery> for QueryInput {
    fn from(query: &CropQuery) -> Self {
        Self {
            nitrogen: Some(query.nitrogen),
            phosphorus: Some(query.phosphorus),
            potassium: Some(query.potassium),
            ph: Some(query.ph),
            rainfall: Some(query.rainfall),
            location: Some(query.location.clone()),
            temperature: query.temperature,
            humidity: query.humidity,
        }
    }
}

impl TryFrom<QueryInput> for CropQuery {
    type Error = ValidationError;

    fn try_from(input: QueryInput) -> Result<Self, Self::Error> {
        input.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> QueryInput {
        QueryInput {
            nitrogen: Some(90.0),
            phosphorus: Some(40.0),
            potassium: Some(40.0),
            ph: Some(6.5),
            rainfall: Some(200.0),
            location: Some("TestCity".to_string()),
            temperature: None,
            humidity: None,
        }
    }

    #[test]
    fn test_valid_query() {
        let query = valid_input().validate().unwrap();
        assert_eq!(query.nitrogen(), 90.0);
        assert_eq!(query.ph(), 6.5);
        assert_eq!(query.location(), "TestCity");
        assert_eq!(query.temperature(), None);
    }

    #[test]
    fn test_ph_bounds_are_inclusive() {
        for ph in [0.0, 14.0] {
            let input = QueryInput {
                ph: Some(ph),
                ..valid_input()
            };
            assert!(input.validate().is_ok(), "pH {} should be accepted", ph);
        }

        for ph in [-0.1, 14.01, 15.0] {
            let input = QueryInput {
                ph: Some(ph),
                ..valid_input()
            };
            let err = input.validate().unwrap_err();
            assert!(err.has_field("ph"), "pH {} should be rejected", ph);
        }
    }

    #[test]
    fn test_negative_nutrients_rejected() {
        let input = QueryInput {
            nitrogen: Some(-1.0),
            rainfall: Some(-5.0),
            ..valid_input()
        };

        let err = input.validate().unwrap_err();
        assert_eq!(err.fields.len(), 2);
        assert!(err.has_field("nitrogen"));
        assert!(err.has_field("rainfall"));
    }

    #[test]
    fn test_missing_and_blank_fields() {
        let input = QueryInput {
            potassium: None,
            location: Some("   ".to_string()),
            ..valid_input()
        };

        let err = input.validate().unwrap_err();
        assert!(err.has_field("potassium"));
        assert!(err.has_field("location"));
        assert_eq!(
            err.to_string(),
            "Invalid query: potassium is required; location must not be empty"
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let input = QueryInput {
            phosphorus: Some(f64::NAN),
            temperature: Some(f64::INFINITY),
            ..valid_input()
        };

        let err = input.validate().unwrap_err();
        assert!(err.has_field("phosphorus"));
        assert!(err.has_field("temperature"));
    }

    #[test]
    fn test_humidity_range() {
        let input = QueryInput {
            humidity: Some(101.0),
            ..valid_input()
        };
        assert!(input.validate().unwrap_err().has_field("humidity"));

        let input = QueryInput {
            humidity: Some(100.0),
            ..valid_input()
        };
        assert_eq!(input.validate().unwrap().humidity(), Some(100.0));
    }

    #[test]
    fn test_location_is_trimmed() {
        let input = QueryInput {
            location: Some("  Pune ".to_string()),
            ..valid_input()
        };
        assert_eq!(input.validate().unwrap().location(), "Pune");
    }

    #[test]
    fn test_deserialize_accepts_aliases() {
        let json = r#"{
            "nitrogen": 90, "phosphorus": 40, "potassium": 40,
            "acidity": 6.5, "rainfall": 200, "city": "TestCity"
        }"#;

        let input: QueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.ph, Some(6.5));
        assert_eq!(input.location.as_deref(), Some("TestCity"));
        assert!(CropQuery::try_from(input).is_ok());
    }

    #[test]
    fn test_with_conditions_revalidates() {
        let query = CropQuery::new(90.0, 40.0, 40.0, 6.5, 200.0, "TestCity").unwrap();

        let manual = query.with_conditions(Some(25.0), Some(80.0)).unwrap();
        assert_eq!(manual.temperature(), Some(25.0));
        assert_eq!(manual.humidity(), Some(80.0));
        assert_eq!(manual.nitrogen(), query.nitrogen());

        assert!(query.with_conditions(Some(25.0), Some(-1.0)).is_err());
    }
}
