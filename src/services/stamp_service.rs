use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{Clock, validate_phone};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct StampCardRow {
    id: String,
    total_stamps: i64,
    expiry_date: chrono::DateTime<chrono::Utc>,
}

/// 集章：把一笔集章交易记入客户在该活动下的集章卡
#[derive(Clone)]
pub struct StampService<C: Clock> {
    pool: DbPool,
    clock: C,
}

impl<C: Clock> StampService<C> {
    pub fn new(pool: DbPool, clock: C) -> Self {
        Self { pool, clock }
    }

    pub async fn collect_stamps(
        &self,
        request: CollectStampsRequest,
    ) -> AppResult<CollectStampsResponse> {
        if request.transaction_id.is_empty() || request.phone_number.is_empty() {
            return Err(AppError::ValidationError("Invalid request body".to_string()));
        }
        validate_phone(&request.phone_number)?;

        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customer WHERE phone = ?")
                .bind(&request.phone_number)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Phone number not found.".to_string()))?;

        let transaction = sqlx::query_as::<_, StampTransaction>(
            "SELECT * FROM stamp_transaction WHERE id = ?",
        )
        .bind(&request.transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found.".to_string()))?;

        let stamp_amount = transaction
            .stamp_amount
            .ok_or_else(|| AppError::ValidationError("Transaction is invalid.".to_string()))?;

        if transaction.is_used {
            return Err(AppError::Conflict(
                "Transaction is already used.".to_string(),
            ));
        }

        // 集章卡懒创建，且独立提交：即便随后活动已过期，卡记录也保留
        sqlx::query(
            r#"
            INSERT INTO customer_stamp (id, customer_id, campaign_id, total_stamps, created_at)
            VALUES (?, ?, ?, 0, ?)
            ON CONFLICT (customer_id, campaign_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&customer.id)
        .bind(&transaction.campaign_id)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;

        let card = sqlx::query_as::<_, StampCardRow>(
            r#"
            SELECT cs.id, cs.total_stamps, c.expiry_date
            FROM customer_stamp cs
            JOIN campaign c ON c.id = cs.campaign_id
            WHERE cs.customer_id = ? AND cs.campaign_id = ?
            "#,
        )
        .bind(&customer.id)
        .bind(&transaction.campaign_id)
        .fetch_one(&self.pool)
        .await?;

        if card.expiry_date < self.clock.now() {
            return Err(AppError::CampaignExpired {
                expiry_date: card.expiry_date,
            });
        }

        // 核销与记账必须同进同退：条件更新收口单次使用，
        // 两个并发请求只有一个能把 is_used 从 0 翻到 1
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE stamp_transaction SET is_used = 1 WHERE id = ? AND is_used = 0",
        )
        .bind(&transaction.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if consumed == 0 {
            return Err(AppError::Conflict(
                "Transaction is already used.".to_string(),
            ));
        }

        let new_total: i64 = sqlx::query_scalar(
            "UPDATE customer_stamp SET total_stamps = total_stamps + ? WHERE id = ? RETURNING total_stamps",
        )
        .bind(stamp_amount)
        .bind(&card.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Collected {} stamp(s) on card {} via transaction {}",
            stamp_amount,
            card.id,
            transaction.id
        );

        Ok(CollectStampsResponse {
            success: true,
            new_total_stamps: new_total,
            is_expired: false,
            expiry_date: card.expiry_date,
            message: format!(
                "You have collected {} new stamp(s). Your current total is now {} stamp(s).",
                stamp_amount, new_total
            ),
            customer_stamp_id: card.id,
        })
    }

    /// 集章卡视图：余额、过期状态，以及各奖励的兑换状态
    pub async fn get_stamp_card(&self, customer_stamp_id: &str) -> AppResult<StampCardResponse> {
        if customer_stamp_id.is_empty() {
            return Err(AppError::ValidationError(
                "customer_stamp_id is required".to_string(),
            ));
        }

        let card = sqlx::query_as::<_, StampCardRow>(
            r#"
            SELECT cs.id, cs.total_stamps, c.expiry_date
            FROM customer_stamp cs
            JOIN campaign c ON c.id = cs.campaign_id
            WHERE cs.id = ?
            "#,
        )
        .bind(customer_stamp_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer stamp not found.".to_string()))?;

        #[derive(FromRow)]
        struct RewardRow {
            id: String,
            total_stamps: i64,
            reward_title: String,
            reward_desc: Option<String>,
            is_redeemed: bool,
        }

        let rewards = sqlx::query_as::<_, RewardRow>(
            r#"
            SELECT r.id, r.total_stamps, r.reward_title, r.reward_desc,
                   (red.id IS NOT NULL) AS is_redeemed
            FROM redemption_rule r
            LEFT JOIN redemption red
                ON red.redemption_rule_id = r.id AND red.customer_stamp_id = ?
            WHERE r.campaign_id = (SELECT campaign_id FROM customer_stamp WHERE id = ?)
            ORDER BY r.total_stamps
            "#,
        )
        .bind(customer_stamp_id)
        .bind(customer_stamp_id)
        .fetch_all(&self.pool)
        .await?;

        let is_expired = card.expiry_date < self.clock.now();

        Ok(StampCardResponse {
            // 活动过期后卡面余额显示为 0
            total_stamps: if is_expired { 0 } else { card.total_stamps },
            is_expired,
            expiry_date: card.expiry_date,
            rewards: rewards
                .into_iter()
                .map(|r| StampCardReward {
                    id: r.id,
                    total_stamps: r.total_stamps,
                    reward_title: r.reward_title,
                    reward_desc: r.reward_desc,
                    is_redeemed: r.is_redeemed,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::{contended_test_pool, test_pool};
    use crate::services::TransactionService;
    use crate::services::test_support::{PHONE, clock, seed_campaign, seed_customer, seed_rule};
    use crate::utils::FixedClock;
    use chrono::Duration;

    async fn author_stamp_transaction(
        pool: &DbPool,
        clock: &FixedClock,
        campaign_id: &str,
        amount: i64,
    ) -> String {
        TransactionService::new(pool.clone(), clock.clone())
            .create_transaction(CreateTransactionRequest {
                campaign_id: campaign_id.to_string(),
                stamp_amount: Some(amount),
                redemption_rule_id: None,
            })
            .await
            .unwrap()
            .transaction_id
    }

    fn collect_request(transaction_id: &str) -> CollectStampsRequest {
        CollectStampsRequest {
            transaction_id: transaction_id.to_string(),
            phone_number: PHONE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_collect_creates_card_and_credits_stamps() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 10).await;
        let service = StampService::new(pool, clock);

        let response = service.collect_stamps(collect_request(&tx_id)).await.unwrap();
        assert_eq!(response.new_total_stamps, 10);
        assert!(!response.is_expired);
        assert!(!response.customer_stamp_id.is_empty());
        assert!(response.message.contains("10 new stamp(s)"));
    }

    #[tokio::test]
    async fn test_collect_twice_fails_and_total_is_unchanged() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 5).await;
        let service = StampService::new(pool, clock);

        let first = service.collect_stamps(collect_request(&tx_id)).await.unwrap();
        assert_eq!(first.new_total_stamps, 5);

        assert!(matches!(
            service.collect_stamps(collect_request(&tx_id)).await,
            Err(AppError::Conflict(_))
        ));

        let card = service.get_stamp_card(&first.customer_stamp_id).await.unwrap();
        assert_eq!(card.total_stamps, 5);
    }

    #[tokio::test]
    async fn test_collect_accumulates_across_transactions() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let first = author_stamp_transaction(&pool, &clock, "c1", 3).await;
        let second = author_stamp_transaction(&pool, &clock, "c1", 4).await;
        let service = StampService::new(pool, clock);

        service.collect_stamps(collect_request(&first)).await.unwrap();
        let response = service.collect_stamps(collect_request(&second)).await.unwrap();
        assert_eq!(response.new_total_stamps, 7);
    }

    #[tokio::test]
    async fn test_collect_on_expired_campaign_fails_but_card_persists() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::hours(1)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 5).await;
        let service = StampService::new(pool.clone(), clock.clone());

        clock.advance(Duration::hours(2));
        assert!(matches!(
            service.collect_stamps(collect_request(&tx_id)).await,
            Err(AppError::CampaignExpired { .. })
        ));

        // 懒创建的卡记录保留，交易未被核销
        let cards: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customer_stamp WHERE campaign_id = 'c1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(cards, 1);

        let is_used: bool =
            sqlx::query_scalar("SELECT is_used FROM stamp_transaction WHERE id = ?")
                .bind(&tx_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(!is_used);
    }

    #[tokio::test]
    async fn test_redemption_transaction_cannot_collect() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        seed_rule(&pool, "r1", "c1", 5).await;

        let tx_id = TransactionService::new(pool.clone(), clock.clone())
            .create_transaction(CreateTransactionRequest {
                campaign_id: "c1".to_string(),
                stamp_amount: None,
                redemption_rule_id: Some("r1".to_string()),
            })
            .await
            .unwrap()
            .transaction_id;

        let service = StampService::new(pool, clock);
        assert!(matches!(
            service.collect_stamps(collect_request(&tx_id)).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_transaction_and_phone() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 5).await;
        let service = StampService::new(pool, clock);

        assert!(matches!(
            service.collect_stamps(collect_request("nope")).await,
            Err(AppError::NotFound(_))
        ));

        let request = CollectStampsRequest {
            transaction_id: tx_id,
            phone_number: "6500000000".to_string(),
        };
        assert!(matches!(
            service.collect_stamps(request).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stamp_card_view_reports_zero_after_expiry() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::hours(1)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 8).await;
        let service = StampService::new(pool, clock.clone());

        let collected = service.collect_stamps(collect_request(&tx_id)).await.unwrap();

        let card = service.get_stamp_card(&collected.customer_stamp_id).await.unwrap();
        assert_eq!(card.total_stamps, 8);
        assert!(!card.is_expired);

        clock.advance(Duration::hours(2));
        let card = service.get_stamp_card(&collected.customer_stamp_id).await.unwrap();
        assert_eq!(card.total_stamps, 0);
        assert!(card.is_expired);
    }

    #[tokio::test]
    async fn test_malformed_phone_rejected_before_lookup() {
        let pool = test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 5).await;
        let service = StampService::new(pool, clock);

        let request = CollectStampsRequest {
            transaction_id: tx_id,
            phone_number: "+6591234567".to_string(),
        };
        assert!(matches!(
            service.collect_stamps(request).await,
            Err(AppError::ValidationError(_))
        ));
    }

    // 两个并发请求争用同一笔交易，只有条件核销能挡住第二次记账
    #[tokio::test]
    async fn test_concurrent_collect_credits_once() {
        let pool = contended_test_pool().await;
        let clock = clock();
        seed_campaign(&pool, "c1", clock.now() + Duration::days(7)).await;
        seed_customer(&pool, PHONE).await;
        let tx_id = author_stamp_transaction(&pool, &clock, "c1", 5).await;
        let service = StampService::new(pool.clone(), clock);

        let (first, second) = tokio::join!(
            service.collect_stamps(collect_request(&tx_id)),
            service.collect_stamps(collect_request(&tx_id)),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        // 记账恰好一次，交易已核销
        let total: i64 = sqlx::query_scalar(
            "SELECT total_stamps FROM customer_stamp WHERE campaign_id = 'c1'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(total, 5);

        let is_used: bool =
            sqlx::query_scalar("SELECT is_used FROM stamp_transaction WHERE id = ?")
                .bind(&tx_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(is_used);
    }
}
