use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::purchase_entity;

/// Claim request. Required: raffle_id, buyer_name, buyer_phone, number.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CreatePurchaseRequest {
    #[schema(example = 1)]
    pub raffle_id: Option<i64>,
    #[schema(example = "Ana")]
    pub buyer_name: Option<String>,
    #[schema(example = "+55 11 91234-5678")]
    pub buyer_phone: Option<String>,
    pub buyer_email: Option<String>,
    #[schema(example = 3)]
    pub number: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: i64,
    pub raffle_id: i64,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Option<String>,
    pub number: i32,
    pub created_at: DateTime<Utc>,
}

impl From<purchase_entity::Model> for PurchaseResponse {
    fn from(m: purchase_entity::Model) -> Self {
        PurchaseResponse {
            id: m.id,
            raffle_id: m.raffle_id,
            buyer_name: m.buyer_name,
            buyer_phone: m.buyer_phone,
            buyer_email: m.buyer_email,
            number: m.number,
            created_at: m.created_at,
        }
    }
}

/// Purchase joined with the title of its raffle (admin listing)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseWithRaffleResponse {
    pub id: i64,
    pub raffle_id: i64,
    pub raffle_title: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Option<String>,
    pub number: i32,
    pub created_at: DateTime<Utc>,
}

impl PurchaseWithRaffleResponse {
    pub fn new(m: purchase_entity::Model, raffle_title: String) -> Self {
        PurchaseWithRaffleResponse {
            id: m.id,
            raffle_id: m.raffle_id,
            raffle_title,
            buyer_name: m.buyer_name,
            buyer_phone: m.buyer_phone,
            buyer_email: m.buyer_email,
            number: m.number,
            created_at: m.created_at,
        }
    }
}

/// `{ "purchase": {...} }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseEnvelope {
    pub purchase: PurchaseResponse,
}

/// `{ "purchases": [...] }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminPurchaseListResponse {
    pub purchases: Vec<PurchaseWithRaffleResponse>,
}
