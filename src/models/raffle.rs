use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::entities::{RaffleStatus, raffle_entity};
use crate::error::{AppError, AppResult};

/// Raffle list query
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RaffleListQuery {
    /// Only raffles with this status (active / closed / cancelled)
    pub status: Option<String>,
}

/// Create raffle request. Everything but `images` is required; fields are
/// optional here so a missing one is reported as a validation error.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateRaffleRequest {
    #[schema(example = "Cesta de Natal")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = json!(["/uploads/cesta-1.jpg", "/uploads/cesta-2.jpg"]))]
    pub images: Option<Vec<String>>,
    #[schema(example = 5.0)]
    pub price_per_number: Option<f64>,
    #[schema(example = 100)]
    pub total_numbers: Option<i32>,
    /// RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
    #[schema(example = "2025-12-24T20:00:00Z")]
    pub draw_date: Option<String>,
}

/// Partial update: absent fields keep their current value.
/// `winner_number` / `winner_name` may be sent as `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateRaffleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub price_per_number: Option<f64>,
    pub total_numbers: Option<i32>,
    pub draw_date: Option<String>,
    pub status: Option<RaffleStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub winner_number: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub winner_name: Option<Option<String>>,
}

/// Distinguishes "field absent" (outer None) from "field is null" (Some(None)).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RaffleResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Image path references, in upload order
    pub images: Vec<String>,
    pub price_per_number: f64,
    pub total_numbers: i32,
    pub draw_date: DateTime<Utc>,
    pub status: RaffleStatus,
    pub winner_number: Option<i32>,
    pub winner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<raffle_entity::Model> for RaffleResponse {
    type Error = AppError;

    fn try_from(m: raffle_entity::Model) -> AppResult<Self> {
        Ok(RaffleResponse {
            images: decode_images(m.images.as_deref())?,
            id: m.id,
            title: m.title,
            description: m.description,
            price_per_number: m.price_per_number,
            total_numbers: m.total_numbers,
            draw_date: m.draw_date,
            status: m.status,
            winner_number: m.winner_number,
            winner_name: m.winner_name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// `{ "raffles": [...] }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RaffleListResponse {
    pub raffles: Vec<RaffleResponse>,
}

/// `{ "raffle": {...} }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RaffleEnvelope {
    pub raffle: RaffleResponse,
}

/// Raffle plus the numbers already sold, ascending
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RaffleDetailResponse {
    pub raffle: RaffleResponse,
    #[serde(rename = "purchasedNumbers")]
    pub purchased_numbers: Vec<i32>,
}

/// Images are kept at rest as a JSON-encoded array
pub fn encode_images(images: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(images)?)
}

pub fn decode_images(raw: Option<&str>) -> AppResult<Vec<String>> {
    match raw {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() || s.trim() == "null" => Ok(Vec::new()),
        Some(s) => Ok(serde_json::from_str(s)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_keep_order() {
        let images = vec!["/uploads/b.jpg".to_string(), "/uploads/a.jpg".to_string()];
        let raw = encode_images(&images).unwrap();
        assert_eq!(raw, r#"["/uploads/b.jpg","/uploads/a.jpg"]"#);
        assert_eq!(decode_images(Some(&raw)).unwrap(), images);
    }

    #[test]
    fn test_missing_images_decode_empty() {
        assert!(decode_images(None).unwrap().is_empty());
        assert!(decode_images(Some("null")).unwrap().is_empty());
        assert!(matches!(
            decode_images(Some("not json")),
            Err(AppError::SerdeJsonError(_))
        ));
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateRaffleRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.winner_number, None);

        let cleared: UpdateRaffleRequest =
            serde_json::from_str(r#"{"winner_number":null,"winner_name":null}"#).unwrap();
        assert_eq!(cleared.winner_number, Some(None));
        assert_eq!(cleared.winner_name, Some(None));

        let set: UpdateRaffleRequest =
            serde_json::from_str(r#"{"winner_number":7,"status":"closed"}"#).unwrap();
        assert_eq!(set.winner_number, Some(Some(7)));
        assert_eq!(set.status, Some(RaffleStatus::Closed));
    }

    #[test]
    fn test_detail_uses_camel_case_numbers() {
        let now = Utc::now();
        let detail = RaffleDetailResponse {
            raffle: RaffleResponse {
                id: 1,
                title: "t".into(),
                description: "d".into(),
                images: vec![],
                price_per_number: 5.0,
                total_numbers: 10,
                draw_date: now,
                status: RaffleStatus::Active,
                winner_number: None,
                winner_name: None,
                created_at: now,
                updated_at: now,
            },
            purchased_numbers: vec![3],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["purchasedNumbers"], serde_json::json!([3]));
        assert_eq!(value["raffle"]["status"], "active");
    }
}
