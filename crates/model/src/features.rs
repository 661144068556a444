//! Feature encoding for the yield regressor.
//!
//! The trained scaler and model consume a vector of exactly
//! [`FEATURE_COUNT`] values laid out as [`FEATURE_NAMES`]. Reordering these
//! silently corrupts every prediction, so the layout lives in one place and
//! every accessor goes through the named slots below.

use crate::error::EncodeError;
use crate::vocabulary::Vocabularies;
use ndarray::Array1;
use serde_json::Value;

pub const FEATURE_COUNT: usize = 6;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "region_index",
    "crop_index",
    "year",
    "rainfall",
    "pesticide_use",
    "avg_temperature",
];

pub const REGION_SLOT: usize = 0;
pub const CROP_SLOT: usize = 1;
pub const YEAR_SLOT: usize = 2;
pub const RAINFALL_SLOT: usize = 3;
pub const PESTICIDE_SLOT: usize = 4;
pub const TEMPERATURE_SLOT: usize = 5;

/// Typed prediction input.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub region: String,
    pub crop: String,
    pub year: i64,
    pub rainfall: f64,
    pub pesticide_use: f64,
    pub avg_temperature: f64,
}

/// Prediction input as it arrives from an untyped boundary (JSON body).
#[derive(Debug, Clone, PartialEq)]
pub struct RawPredictionRequest {
    pub region: String,
    pub crop: String,
    pub year: Value,
    pub rainfall: Value,
    pub pesticide_use: Value,
    pub avg_temperature: Value,
}

impl RawPredictionRequest {
    /// Coerce the numeric fields; the first field that cannot be read is reported.
    pub fn coerce(self) -> Result<PredictionRequest, EncodeError> {
        Ok(PredictionRequest {
            year: coerce_year(&self.year)?,
            rainfall: coerce_number("rainfall", &self.rainfall)?,
            pesticide_use: coerce_number("pesticide_use", &self.pesticide_use)?,
            avg_temperature: coerce_number("avg_temperature", &self.avg_temperature)?,
            region: self.region,
            crop: self.crop,
        })
    }
}

fn coerce_number(field: &'static str, value: &Value) -> Result<f64, EncodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or(EncodeError::InvalidNumericField { field })
}

fn coerce_year(value: &Value) -> Result<i64, EncodeError> {
    let invalid = EncodeError::InvalidNumericField { field: "year" };
    if let Some(year) = value.as_i64() {
        return Ok(year);
    }
    let year = coerce_number("year", value)?;
    if year.fract() != 0.0 || year.abs() > i64::MAX as f64 {
        return Err(invalid);
    }
    Ok(year as i64)
}

/// Fixed-order numeric encoding of a [`PredictionRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.0.to_vec())
    }

    pub fn region_index(&self) -> f64 {
        self.0[REGION_SLOT]
    }

    pub fn crop_index(&self) -> f64 {
        self.0[CROP_SLOT]
    }

    pub fn year(&self) -> f64 {
        self.0[YEAR_SLOT]
    }

    pub fn rainfall(&self) -> f64 {
        self.0[RAINFALL_SLOT]
    }

    pub fn pesticide_use(&self) -> f64 {
        self.0[PESTICIDE_SLOT]
    }

    pub fn avg_temperature(&self) -> f64 {
        self.0[TEMPERATURE_SLOT]
    }
}

pub fn encode(
    vocabularies: &Vocabularies,
    request: &PredictionRequest,
) -> Result<FeatureVector, EncodeError> {
    let region = vocabularies
        .region
        .index_of(&request.region)
        .ok_or_else(|| EncodeError::UnknownCategory {
            field: "region",
            value: request.region.clone(),
        })?;
    let crop = vocabularies
        .crop
        .index_of(&request.crop)
        .ok_or_else(|| EncodeError::UnknownCategory {
            field: "crop",
            value: request.crop.clone(),
        })?;

    let mut values = [0.0; FEATURE_COUNT];
    values[REGION_SLOT] = region as f64;
    values[CROP_SLOT] = crop as f64;
    values[YEAR_SLOT] = request.year as f64;
    values[RAINFALL_SLOT] = request.rainfall;
    values[PESTICIDE_SLOT] = request.pesticide_use;
    values[TEMPERATURE_SLOT] = request.avg_temperature;

    for (slot, value) in values.iter().enumerate().skip(RAINFALL_SLOT) {
        if !value.is_finite() {
            return Err(EncodeError::InvalidNumericField {
                field: FEATURE_NAMES[slot],
            });
        }
    }
    Ok(FeatureVector(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::CategoryVocabulary;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vocabularies() -> Vocabularies {
        Vocabularies {
            region: CategoryVocabulary::from_labels(["Albania", "India"]),
            crop: CategoryVocabulary::from_labels(["Maize", "Rice"]),
        }
    }

    fn request(region: &str, crop: &str) -> PredictionRequest {
        PredictionRequest {
            region: region.to_string(),
            crop: crop.to_string(),
            year: 2020,
            rainfall: 1200.0,
            pesticide_use: 50.0,
            avg_temperature: 22.5,
        }
    }

    #[test]
    fn encodes_in_fixed_order() {
        let vector = encode(&vocabularies(), &request("India", "Rice")).unwrap();
        assert_eq!(vector.values(), [1.0, 1.0, 2020.0, 1200.0, 50.0, 22.5]);
    }

    #[test]
    fn each_slot_maps_to_its_field() {
        let req = PredictionRequest {
            region: "Albania".to_string(),
            crop: "Rice".to_string(),
            year: 1999,
            rainfall: 3.0,
            pesticide_use: 4.0,
            avg_temperature: 5.0,
        };
        let vector = encode(&vocabularies(), &req).unwrap();
        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
        assert_eq!(vector.region_index(), 0.0);
        assert_eq!(vector.crop_index(), 1.0);
        assert_eq!(vector.year(), 1999.0);
        assert_eq!(vector.rainfall(), 3.0);
        assert_eq!(vector.pesticide_use(), 4.0);
        assert_eq!(vector.avg_temperature(), 5.0);
        assert_eq!(FEATURE_NAMES[YEAR_SLOT], "year");
        assert_eq!(FEATURE_NAMES[TEMPERATURE_SLOT], "avg_temperature");
    }

    #[test]
    fn unknown_region_names_the_field() {
        let err = encode(&vocabularies(), &request("Atlantis", "Rice")).unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnknownCategory {
                field: "region",
                value: "Atlantis".to_string()
            }
        );
    }

    #[test]
    fn unknown_crop_names_the_field() {
        let err = encode(&vocabularies(), &request("India", "Quinoa")).unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnknownCategory {
                field: "crop",
                value: "Quinoa".to_string()
            }
        );
    }

    #[test]
    fn empty_vocabulary_rejects_everything() {
        let err = encode(&Vocabularies::default(), &request("India", "Rice")).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::UnknownCategory { field: "region", .. }
        ));
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let mut req = request("India", "Rice");
        req.pesticide_use = f64::NAN;
        let err = encode(&vocabularies(), &req).unwrap_err();
        assert_eq!(
            err,
            EncodeError::InvalidNumericField {
                field: "pesticide_use"
            }
        );
    }

    #[test]
    fn raw_request_accepts_numeric_strings() {
        let raw = RawPredictionRequest {
            region: "India".to_string(),
            crop: "Rice".to_string(),
            year: json!("2020"),
            rainfall: json!(1200),
            pesticide_use: json!(" 50.5 "),
            avg_temperature: json!(22.5),
        };
        let req = raw.coerce().unwrap();
        assert_eq!(req.year, 2020);
        assert_eq!(req.rainfall, 1200.0);
        assert_eq!(req.pesticide_use, 50.5);
    }

    #[test]
    fn raw_request_reports_first_bad_field() {
        let raw = RawPredictionRequest {
            region: "India".to_string(),
            crop: "Rice".to_string(),
            year: json!(2020.0),
            rainfall: json!("lots"),
            pesticide_use: Value::Null,
            avg_temperature: json!(22.5),
        };
        assert_eq!(
            raw.coerce().unwrap_err(),
            EncodeError::InvalidNumericField { field: "rainfall" }
        );
    }

    #[test]
    fn fractional_year_is_rejected() {
        let raw = RawPredictionRequest {
            region: "India".to_string(),
            crop: "Rice".to_string(),
            year: json!(2020.5),
            rainfall: json!(1.0),
            pesticide_use: json!(1.0),
            avg_temperature: json!(1.0),
        };
        assert_eq!(
            raw.coerce().unwrap_err(),
            EncodeError::InvalidNumericField { field: "year" }
        );
    }

    #[test]
    fn missing_and_boolean_fields_are_rejected() {
        let raw = RawPredictionRequest {
            region: "India".to_string(),
            crop: "Rice".to_string(),
            year: json!(2020),
            rainfall: json!(true),
            pesticide_use: json!(1.0),
            avg_temperature: Value::Null,
        };
        assert_eq!(
            raw.coerce().unwrap_err(),
            EncodeError::InvalidNumericField { field: "rainfall" }
        );
    }
}
