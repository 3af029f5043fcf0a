use crate::entities::{RaffleStatus, purchase_entity as purchases, raffle_entity as raffles};
use crate::error::{AppError, AppResult, is_unique_violation};
use crate::models::{CreatePurchaseRequest, PurchaseResponse, PurchaseWithRaffleResponse};
use crate::utils::{optional_text, required_text};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Buyer details of a validated claim
#[derive(Debug, Clone)]
struct Buyer {
    name: String,
    phone: String,
    email: Option<String>,
}

/// Allocation engine: sells each (raffle, number) pair at most once.
///
/// Claims follow a check-then-insert protocol:
/// 1. read the raffle and reject early (not found / not active / out of range / taken)
/// 2. insert with a single `INSERT ... SELECT ... FROM raffles WHERE ...` so the
///    raffle-state guard and the write are one statement
/// 3. a unique-index violation on that insert means another claim won the race
///    and is reported as `Conflict`
///
/// The service keeps no state of its own between calls.
#[derive(Clone)]
pub struct PurchaseService {
    pool: DatabaseConnection,
}

impl PurchaseService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Claims `number` of a raffle for a buyer.
    ///
    /// Failure order: missing fields -> `ValidationError`, unknown raffle ->
    /// `NotFound`, raffle not active -> `InvalidState`, number outside
    /// 1..=total_numbers -> `OutOfRange`, number already sold -> `Conflict`.
    pub async fn claim_number(&self, request: CreatePurchaseRequest) -> AppResult<PurchaseResponse> {
        let (Some(raffle_id), Some(name), Some(phone), Some(number)) = (
            request.raffle_id,
            required_text(request.buyer_name),
            required_text(request.buyer_phone),
            request.number,
        ) else {
            return Err(AppError::ValidationError("Missing required fields".to_string()));
        };
        let buyer = Buyer {
            name,
            phone,
            email: optional_text(request.buyer_email),
        };

        // fast path: friendly rejection before touching the write path
        let raffle = self.find_raffle(raffle_id).await?;
        let number = check_claimable(&raffle, number)?;
        if self.is_taken(raffle_id, number).await? {
            return Err(number_taken(raffle_id, number));
        }

        let purchase_id = match self.insert_guarded(raffle_id, number, &buyer).await? {
            Some(id) => id,
            None => {
                // the raffle changed between the pre-check and the insert
                let raffle = self.find_raffle(raffle_id).await?;
                check_claimable(&raffle, i64::from(number))?;
                return Err(AppError::InternalError(format!(
                    "Claim of number {number} in raffle {raffle_id} was not applied"
                )));
            }
        };

        let purchase = purchases::Entity::find_by_id(purchase_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Purchase disappeared after successful insert".into())
            })?;

        log::info!(
            "Number {} of raffle {} claimed (purchase {})",
            purchase.number,
            purchase.raffle_id,
            purchase.id
        );
        Ok(purchase.into())
    }

    /// Purchases of a raffle, ascending by number. Unknown raffles yield an empty list.
    pub async fn list_purchases(&self, raffle_id: i64) -> AppResult<Vec<PurchaseResponse>> {
        let list = purchases::Entity::find()
            .filter(purchases::Column::RaffleId.eq(raffle_id))
            .order_by_asc(purchases::Column::Number)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// Sold numbers of a raffle, ascending
    pub async fn purchased_numbers(&self, raffle_id: i64) -> AppResult<Vec<i32>> {
        let numbers: Vec<i32> = purchases::Entity::find()
            .select_only()
            .column(purchases::Column::Number)
            .filter(purchases::Column::RaffleId.eq(raffle_id))
            .order_by_asc(purchases::Column::Number)
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(numbers)
    }

    /// Every purchase with its raffle title, newest first
    pub async fn list_all_purchases(&self) -> AppResult<Vec<PurchaseWithRaffleResponse>> {
        let rows = purchases::Entity::find()
            .find_also_related(raffles::Entity)
            .order_by_desc(purchases::Column::CreatedAt)
            .order_by_desc(purchases::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(purchase, raffle)| {
                raffle.map(|r| PurchaseWithRaffleResponse::new(purchase, r.title))
            })
            .collect())
    }

    pub async fn get_purchase(&self, id: i64) -> AppResult<PurchaseResponse> {
        purchases::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))
    }

    /// Deletes a purchase, which makes its number claimable again.
    pub async fn delete_purchase(&self, id: i64) -> AppResult<()> {
        let result = purchases::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Purchase not found".to_string()));
        }
        log::info!("Purchase {id} deleted");
        Ok(())
    }

    // -----------------------------
    // claim protocol helpers
    // -----------------------------

    async fn find_raffle(&self, raffle_id: i64) -> AppResult<raffles::Model> {
        raffles::Entity::find_by_id(raffle_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Raffle not found".to_string()))
    }

    async fn is_taken(&self, raffle_id: i64, number: i32) -> AppResult<bool> {
        let existing = purchases::Entity::find()
            .filter(purchases::Column::RaffleId.eq(raffle_id))
            .filter(purchases::Column::Number.eq(number))
            .one(&self.pool)
            .await?;
        Ok(existing.is_some())
    }

    /// Inserts the purchase only if the raffle is still active and still
    /// covers `number`. Returns the new purchase id, or `None` when the guard
    /// filtered the row out. Unique violations become `Conflict`.
    async fn insert_guarded(
        &self,
        raffle_id: i64,
        number: i32,
        buyer: &Buyer,
    ) -> AppResult<Option<i64>> {
        let source = Query::select()
            .expr(Expr::val(raffle_id))
            .expr(Expr::val(buyer.name.clone()))
            .expr(Expr::val(buyer.phone.clone()))
            .expr(Expr::val(buyer.email.clone()))
            .expr(Expr::val(number))
            .expr(Expr::val(Utc::now()))
            .from(raffles::Entity)
            .and_where(raffles::Column::Id.eq(raffle_id))
            .and_where(raffles::Column::Status.eq(RaffleStatus::Active))
            .and_where(raffles::Column::TotalNumbers.gte(number))
            .to_owned();

        let mut insert = Query::insert();
        insert
            .into_table(purchases::Entity)
            .columns([
                purchases::Column::RaffleId,
                purchases::Column::BuyerName,
                purchases::Column::BuyerPhone,
                purchases::Column::BuyerEmail,
                purchases::Column::Number,
                purchases::Column::CreatedAt,
            ])
            .select_from(source)
            .map_err(|e| AppError::InternalError(format!("Failed to build claim insert: {e:?}")))?;

        let backend = self.pool.get_database_backend();
        match self.pool.execute(backend.build(&insert)).await {
            Ok(result) if result.rows_affected() == 1 => Ok(Some(result.last_insert_id() as i64)),
            Ok(_) => Ok(None),
            Err(err) if is_unique_violation(&err) => {
                // lost the race against a concurrent claim
                Err(number_taken(raffle_id, number))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Applies the raffle-state preconditions in order and narrows `number`.
fn check_claimable(raffle: &raffles::Model, number: i64) -> AppResult<i32> {
    if !raffle.is_active() {
        return Err(AppError::InvalidState("Raffle is not active".to_string()));
    }
    if !raffle.accepts_number(number) {
        return Err(AppError::OutOfRange(format!(
            "Invalid number: must be between 1 and {}",
            raffle.total_numbers
        )));
    }
    i32::try_from(number).map_err(|_| AppError::OutOfRange("Invalid number".to_string()))
}

fn number_taken(raffle_id: i64, number: i32) -> AppError {
    log::debug!("Number {number} of raffle {raffle_id} is already taken");
    AppError::Conflict("Number already purchased".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::models::{CreateRaffleRequest, UpdateRaffleRequest};
    use crate::services::RaffleService;
    use futures_util::future::join_all;
    use sea_orm::{ActiveModelTrait, Set};

    async fn setup(total_numbers: i32) -> (PurchaseService, RaffleService, i64) {
        let pool = memory_pool().await;
        let raffles = RaffleService::new(pool.clone());
        let raffle = raffles
            .create_raffle(CreateRaffleRequest {
                title: Some("Rifa beneficente".into()),
                description: Some("Prêmio: bicicleta".into()),
                images: None,
                price_per_number: Some(5.0),
                total_numbers: Some(total_numbers),
                draw_date: Some("2025-12-24".into()),
            })
            .await
            .unwrap();
        (PurchaseService::new(pool), raffles, raffle.id)
    }

    fn claim(raffle_id: i64, number: i64, buyer: &str) -> CreatePurchaseRequest {
        CreatePurchaseRequest {
            raffle_id: Some(raffle_id),
            buyer_name: Some(buyer.to_string()),
            buyer_phone: Some("11 98888-7777".to_string()),
            buyer_email: Some(format!("{}@example.com", buyer.to_lowercase())),
            number: Some(number),
        }
    }

    #[tokio::test]
    async fn test_claim_then_conflict() {
        let (service, _, raffle_id) = setup(10).await;

        let purchase = service.claim_number(claim(raffle_id, 3, "Ana")).await.unwrap();
        assert_eq!(purchase.number, 3);
        assert_eq!(purchase.raffle_id, raffle_id);
        assert_eq!(purchase.buyer_name, "Ana");
        assert_eq!(purchase.buyer_email.as_deref(), Some("ana@example.com"));

        let second = service.claim_number(claim(raffle_id, 3, "Bruno")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        assert_eq!(service.purchased_numbers(raffle_id).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let (service, _, raffle_id) = setup(10).await;

        let mut no_name = claim(raffle_id, 1, "Ana");
        no_name.buyer_name = Some("  ".into());
        assert!(matches!(
            service.claim_number(no_name).await,
            Err(AppError::ValidationError(_))
        ));

        let mut no_phone = claim(raffle_id, 1, "Ana");
        no_phone.buyer_phone = None;
        assert!(matches!(
            service.claim_number(no_phone).await,
            Err(AppError::ValidationError(_))
        ));

        let mut no_number = claim(raffle_id, 1, "Ana");
        no_number.number = None;
        assert!(matches!(
            service.claim_number(no_number).await,
            Err(AppError::ValidationError(_))
        ));

        let mut no_raffle = claim(raffle_id, 1, "Ana");
        no_raffle.raffle_id = None;
        assert!(matches!(
            service.claim_number(no_raffle).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_email_is_stored_as_null() {
        let (service, _, raffle_id) = setup(10).await;
        let mut request = claim(raffle_id, 4, "Ana");
        request.buyer_email = Some(String::new());
        let purchase = service.claim_number(request).await.unwrap();
        assert_eq!(purchase.buyer_email, None);
    }

    #[tokio::test]
    async fn test_unknown_raffle() {
        let (service, _, raffle_id) = setup(10).await;
        assert!(matches!(
            service.claim_number(claim(raffle_id + 100, 1, "Ana")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_numbers() {
        let (service, _, raffle_id) = setup(10).await;
        for number in [0, -1, 11, i64::from(i32::MAX) + 1] {
            assert!(
                matches!(
                    service.claim_number(claim(raffle_id, number, "Ana")).await,
                    Err(AppError::OutOfRange(_))
                ),
                "number {number}"
            );
        }
        // boundaries are valid
        service.claim_number(claim(raffle_id, 1, "Ana")).await.unwrap();
        service.claim_number(claim(raffle_id, 10, "Ana")).await.unwrap();
    }

    #[tokio::test]
    async fn test_inactive_raffle_rejects_free_number() {
        let (service, raffles, raffle_id) = setup(10).await;
        for status in [RaffleStatus::Closed, RaffleStatus::Cancelled] {
            raffles
                .update_raffle(
                    raffle_id,
                    UpdateRaffleRequest {
                        status: Some(status),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert!(matches!(
                service.claim_number(claim(raffle_id, 5, "Ana")).await,
                Err(AppError::InvalidState(_))
            ));
            // state check comes before the range check
            assert!(matches!(
                service.claim_number(claim(raffle_id, 50, "Ana")).await,
                Err(AppError::InvalidState(_))
            ));
        }
        assert!(service.list_purchases(raffle_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_frees_number() {
        let (service, _, raffle_id) = setup(10).await;
        let purchase = service.claim_number(claim(raffle_id, 7, "Ana")).await.unwrap();

        service.delete_purchase(purchase.id).await.unwrap();
        assert!(matches!(
            service.get_purchase(purchase.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_purchase(purchase.id).await,
            Err(AppError::NotFound(_))
        ));

        let again = service.claim_number(claim(raffle_id, 7, "Bruno")).await.unwrap();
        assert_eq!(again.buyer_name, "Bruno");
        assert_eq!(service.get_purchase(again.id).await.unwrap().number, 7);
    }

    #[tokio::test]
    async fn test_list_purchases_sorted_by_number() {
        let (service, _, raffle_id) = setup(10).await;
        for number in [9, 2, 5] {
            service
                .claim_number(claim(raffle_id, number, "Ana"))
                .await
                .unwrap();
        }
        let numbers: Vec<i32> = service
            .list_purchases(raffle_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.number)
            .collect();
        assert_eq!(numbers, vec![2, 5, 9]);
        assert_eq!(
            service.purchased_numbers(raffle_id).await.unwrap(),
            vec![2, 5, 9]
        );
        assert!(service.list_purchases(raffle_id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_purchases_joins_title_newest_first() {
        let (service, _, raffle_id) = setup(10).await;
        let first = service.claim_number(claim(raffle_id, 1, "Ana")).await.unwrap();
        let second = service.claim_number(claim(raffle_id, 2, "Bruno")).await.unwrap();

        let all = service.list_all_purchases().await.unwrap();
        assert_eq!(
            all.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert!(all.iter().all(|p| p.raffle_title == "Rifa beneficente"));
    }

    #[tokio::test]
    async fn test_concurrent_claims_on_same_number() {
        let (service, _, raffle_id) = setup(10).await;

        let attempts = 16;
        let results = join_all((0..attempts).map(|i| {
            let service = service.clone();
            async move {
                service
                    .claim_number(claim(raffle_id, 4, &format!("Buyer{i}")))
                    .await
            }
        }))
        .await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, attempts - 1);
        assert_eq!(service.list_purchases(raffle_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_claims_on_different_numbers_all_succeed() {
        let (service, _, raffle_id) = setup(10).await;
        let results = join_all((1..=10).map(|n| {
            let service = service.clone();
            async move { service.claim_number(claim(raffle_id, n, "Ana")).await }
        }))
        .await;
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(
            service.purchased_numbers(raffle_id).await.unwrap(),
            (1..=10).collect::<Vec<i32>>()
        );
    }

    #[tokio::test]
    async fn test_store_rejects_duplicate_pair() {
        let (service, _, raffle_id) = setup(10).await;
        service.claim_number(claim(raffle_id, 6, "Ana")).await.unwrap();

        // bypass the pre-check entirely
        let err = purchases::ActiveModel {
            raffle_id: Set(raffle_id),
            buyer_name: Set("Bruno".into()),
            buyer_phone: Set("11 97777-6666".into()),
            buyer_email: Set(None),
            number: Set(6),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&service.pool)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));

        // the guarded insert maps the same violation to Conflict
        let buyer = Buyer {
            name: "Bruno".into(),
            phone: "11 97777-6666".into(),
            email: None,
        };
        assert!(matches!(
            service.insert_guarded(raffle_id, 6, &buyer).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_guarded_insert_skips_when_raffle_changed() {
        let (service, raffles, raffle_id) = setup(10).await;
        let buyer = Buyer {
            name: "Ana".into(),
            phone: "11 98888-7777".into(),
            email: None,
        };

        raffles
            .update_raffle(
                raffle_id,
                UpdateRaffleRequest {
                    total_numbers: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(service.insert_guarded(raffle_id, 8, &buyer).await.unwrap(), None);

        raffles
            .update_raffle(
                raffle_id,
                UpdateRaffleRequest {
                    status: Some(RaffleStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(service.insert_guarded(raffle_id, 2, &buyer).await.unwrap(), None);
        assert!(service.list_purchases(raffle_id).await.unwrap().is_empty());
    }
}
