//! Wastage domain models and DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::entity::wastage;
use crate::error::{AppError, AppResult};

/// Field length limits (mirrored by the column definitions).
pub const MAX_CHALLAN_ID_LEN: usize = 100;
pub const MAX_PARTY_NAME_LEN: usize = 200;
pub const MAX_VEHICLE_NO_LEN: usize = 50;

/// Validated form fields of a create-or-update submission.
#[derive(Debug, Clone)]
pub struct WastageInput {
    pub challan_id: String,
    pub party_name: String,
    pub vehicle_no: String,
    pub date: DateTime<Utc>,
    pub mou_report: Vec<Decimal>,
}

impl WastageInput {
    /// Validate required fields and length bounds before any store mutation.
    pub fn validate(&self) -> AppResult<()> {
        require_bounded("challan_id", &self.challan_id, MAX_CHALLAN_ID_LEN)?;
        require_bounded("party_name", &self.party_name, MAX_PARTY_NAME_LEN)?;
        require_bounded("vehicle_no", &self.vehicle_no, MAX_VEHICLE_NO_LEN)?;

        // challan_id namespaces the image directory; keep it path-safe
        if self.challan_id.contains('/')
            || self.challan_id.contains('\\')
            || self.challan_id.contains("..")
        {
            return Err(AppError::InvalidInput(
                "challan_id must not contain path separators or '..'".to_string(),
            ));
        }

        Ok(())
    }
}

fn require_bounded(field: &str, value: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Missing required field: {}",
            field
        )));
    }
    if value.len() > max_len {
        return Err(AppError::InvalidInput(format!(
            "Field {} exceeds maximum length of {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// An uploaded image file, buffered from the multipart stream.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Original filename as sent by the client (used only for its extension).
    pub filename: String,
    pub data: Vec<u8>,
}

/// Record to insert through the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWastage {
    pub challan_id: String,
    pub party_name: String,
    pub vehicle_no: String,
    pub date: DateTime<Utc>,
    pub mou_report: Vec<Decimal>,
    pub image_urls: Vec<String>,
}

/// Mutable fields of an existing record; mou_report replaces, image_urls is
/// the already-merged full sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct WastageUpdate {
    pub id: i32,
    pub party_name: String,
    pub vehicle_no: String,
    pub date: DateTime<Utc>,
    pub mou_report: Vec<Decimal>,
    pub image_urls: Vec<String>,
}

/// Response body for wastage endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct WastageResponse {
    pub id: i32,
    pub challan_id: String,
    pub party_name: String,
    pub vehicle_no: String,
    pub date: DateTime<Utc>,
    pub mou_report: Vec<Decimal>,
    /// Arithmetic mean of mou_report; absent when the report is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mou_average: Option<Decimal>,
    /// Relative URLs served under /uploads.
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_update: bool,
}

impl WastageResponse {
    pub fn from_model(model: wastage::Model, mou_average: Option<Decimal>, is_update: bool) -> Self {
        Self {
            id: model.id,
            challan_id: model.challan_id,
            party_name: model.party_name,
            vehicle_no: model.vehicle_no,
            date: model.date,
            mou_report: decimals_from_json(&model.mou_report),
            mou_average,
            image_urls: strings_from_json(&model.image_urls),
            created_at: model.created_at,
            updated_at: model.updated_at,
            is_update,
        }
    }
}

/// Response for delete endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

/// Decode a JSONB decimal array column; malformed content yields an empty list.
pub fn decimals_from_json(value: &JsonValue) -> Vec<Decimal> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Decode a JSONB string array column; malformed content yields an empty list.
pub fn strings_from_json(value: &JsonValue) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_input() -> WastageInput {
        WastageInput {
            challan_id: "CH-1001".to_string(),
            party_name: "Acme Traders".to_string(),
            vehicle_no: "MH12AB1234".to_string(),
            date: Utc::now(),
            mou_report: vec![],
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut input = valid_input();
        input.party_name = "   ".to_string();
        assert!(matches!(
            input.validate(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_over_length_fields_rejected() {
        let mut input = valid_input();
        input.challan_id = "x".repeat(MAX_CHALLAN_ID_LEN + 1);
        assert!(input.validate().is_err());

        let mut input = valid_input();
        input.vehicle_no = "x".repeat(MAX_VEHICLE_NO_LEN + 1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_path_unsafe_challan_id_rejected() {
        for bad in ["a/b", "a\\b", "..", "a..b"] {
            let mut input = valid_input();
            input.challan_id = bad.to_string();
            assert!(input.validate().is_err(), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_decimals_from_json() {
        let values = decimals_from_json(&json!([10, 20.5, 30]));
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], Decimal::from(10));

        assert!(decimals_from_json(&json!("not an array")).is_empty());
        assert!(decimals_from_json(&json!([])).is_empty());
    }

    #[test]
    fn test_strings_from_json() {
        let urls = strings_from_json(&json!(["/uploads/wastage/CH-1/a.jpg"]));
        assert_eq!(urls, vec!["/uploads/wastage/CH-1/a.jpg".to_string()]);
        assert!(strings_from_json(&json!(42)).is_empty());
    }
}
