use crate::entities::{RaffleStatus, purchase_entity as purchases, raffle_entity as raffles};
use crate::error::{AppError, AppResult};
use crate::models::{CreateRaffleRequest, RaffleResponse, UpdateRaffleRequest, encode_images};
use crate::utils::{parse_draw_date, required_text};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Raffle registry: CRUD over raffle records.
#[derive(Clone)]
pub struct RaffleService {
    pool: DatabaseConnection,
}

impl RaffleService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Creates a raffle; new raffles always start `active`.
    pub async fn create_raffle(&self, request: CreateRaffleRequest) -> AppResult<RaffleResponse> {
        let (Some(title), Some(description), Some(price), Some(total), Some(draw_date)) = (
            required_text(request.title),
            required_text(request.description),
            request.price_per_number,
            request.total_numbers,
            required_text(request.draw_date),
        ) else {
            return Err(AppError::ValidationError("Missing required fields".to_string()));
        };

        validate_price(price)?;
        validate_total_numbers(total)?;
        let draw_date = parse_draw_date(&draw_date)?;
        let images = request
            .images
            .map(|list| encode_images(&list))
            .transpose()?;

        let now = Utc::now();
        let model = raffles::ActiveModel {
            title: Set(title),
            description: Set(description),
            images: Set(images),
            price_per_number: Set(price),
            total_numbers: Set(total),
            draw_date: Set(draw_date),
            status: Set(RaffleStatus::Active),
            winner_number: Set(None),
            winner_name: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Raffle {} created: {} numbers at {:.2}",
            model.id,
            model.total_numbers,
            model.price_per_number
        );
        RaffleResponse::try_from(model)
    }

    pub async fn get_raffle(&self, id: i64) -> AppResult<RaffleResponse> {
        let model = self.find_raffle(id).await?;
        RaffleResponse::try_from(model)
    }

    /// Lists raffles, newest first. An unknown status matches nothing.
    pub async fn list_raffles(&self, status: Option<&str>) -> AppResult<Vec<RaffleResponse>> {
        let mut query = raffles::Entity::find();

        if let Some(raw) = status.map(str::trim).filter(|s| !s.is_empty()) {
            match RaffleStatus::parse(raw) {
                Some(status) => query = query.filter(raffles::Column::Status.eq(status)),
                None => return Ok(Vec::new()),
            }
        }

        let models = query
            .order_by_desc(raffles::Column::CreatedAt)
            .order_by_desc(raffles::Column::Id)
            .all(&self.pool)
            .await?;

        models.into_iter().map(RaffleResponse::try_from).collect()
    }

    /// Partial update; `updated_at` is refreshed on every call.
    pub async fn update_raffle(
        &self,
        id: i64,
        request: UpdateRaffleRequest,
    ) -> AppResult<RaffleResponse> {
        let existing = self.find_raffle(id).await?;
        let mut model = existing.into_active_model();

        if let Some(title) = request.title {
            model.title = Set(required_text(Some(title)).ok_or_else(|| {
                AppError::ValidationError("title must not be empty".to_string())
            })?);
        }
        if let Some(description) = request.description {
            model.description = Set(required_text(Some(description)).ok_or_else(|| {
                AppError::ValidationError("description must not be empty".to_string())
            })?);
        }
        if let Some(images) = request.images {
            model.images = Set(Some(encode_images(&images)?));
        }
        if let Some(price) = request.price_per_number {
            validate_price(price)?;
            model.price_per_number = Set(price);
        }
        if let Some(total) = request.total_numbers {
            validate_total_numbers(total)?;
            model.total_numbers = Set(total);
        }
        if let Some(draw_date) = request.draw_date {
            model.draw_date = Set(parse_draw_date(&draw_date)?);
        }
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        if let Some(winner_number) = request.winner_number {
            model.winner_number = Set(winner_number);
        }
        if let Some(winner_name) = request.winner_name {
            model.winner_name = Set(winner_name);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&self.pool).await?;
        if let Some(number) = updated.winner_number {
            self.flag_unsold_winner(&updated, number).await?;
        }

        log::info!("Raffle {} updated (status {})", updated.id, updated.status);
        RaffleResponse::try_from(updated)
    }

    /// Deletes a raffle together with all of its purchases.
    pub async fn delete_raffle(&self, id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let raffle = raffles::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Raffle not found".to_string()))?;

        // explicit so the cascade holds even with foreign_keys off
        let removed = purchases::Entity::delete_many()
            .filter(purchases::Column::RaffleId.eq(raffle.id))
            .exec(&txn)
            .await?;
        raffles::Entity::delete_by_id(raffle.id).exec(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Raffle {} deleted with {} purchase(s)",
            raffle.id,
            removed.rows_affected
        );
        Ok(())
    }

    // -----------------------------
    // helpers
    // -----------------------------

    async fn find_raffle(&self, id: i64) -> AppResult<raffles::Model> {
        raffles::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Raffle not found".to_string()))
    }

    /// Winner assignment is accepted as given; an out-of-range or unsold
    /// winner number is only reported.
    async fn flag_unsold_winner(&self, raffle: &raffles::Model, number: i32) -> AppResult<()> {
        if !raffle.accepts_number(i64::from(number)) {
            log::warn!(
                "Raffle {} winner number {} is outside 1..={}",
                raffle.id,
                number,
                raffle.total_numbers
            );
            return Ok(());
        }

        let sold = purchases::Entity::find()
            .filter(purchases::Column::RaffleId.eq(raffle.id))
            .filter(purchases::Column::Number.eq(number))
            .count(&self.pool)
            .await?;
        if sold == 0 {
            log::warn!(
                "Raffle {} winner number {} has not been sold",
                raffle.id,
                number
            );
        }
        Ok(())
    }
}

fn validate_price(price: f64) -> AppResult<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "price_per_number must be positive".to_string(),
        ))
    }
}

fn validate_total_numbers(total: i32) -> AppResult<()> {
    if total > 0 {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "total_numbers must be positive".to_string(),
        ))
    }
}
