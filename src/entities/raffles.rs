use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum RaffleStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RaffleStatus {
    /// Parses the wire/storage form; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(RaffleStatus::Active),
            "closed" => Some(RaffleStatus::Closed),
            "cancelled" => Some(RaffleStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RaffleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaffleStatus::Active => write!(f, "active"),
            RaffleStatus::Closed => write!(f, "closed"),
            RaffleStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Raffle record
/// - images: JSON-encoded array of path references (NULL = none)
/// - total_numbers: valid numbers are 1..=total_numbers
/// - winner_number / winner_name: set by an administrator after the draw
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raffles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub images: Option<String>,
    pub price_per_number: f64,
    pub total_numbers: i32,
    pub draw_date: DateTime<Utc>,
    pub status: RaffleStatus,
    pub winner_number: Option<i32>,
    pub winner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == RaffleStatus::Active
    }

    /// Whether `number` lies within 1..=total_numbers
    pub fn accepts_number(&self, number: i64) -> bool {
        number >= 1 && number <= i64::from(self.total_numbers)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchases::Entity")]
    Purchases,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
