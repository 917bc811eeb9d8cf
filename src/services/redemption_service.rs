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

/// 兑换：用一笔兑换交易核销客户集章卡上的奖励
#[derive(Clone)]
pub struct RedemptionService<C: Clock> {
    pool: DbPool,
    clock: C,
}

impl<C: Clock> RedemptionService<C> {
    pub fn new(pool: DbPool, clock: C) -> Self {
        Self { pool, clock }
    }

    pub async fn redeem_reward(
        &self,
        request: RedeemRewardRequest,
    ) -> AppResult<RedeemRewardResponse> {
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

        let rule_id = transaction
            .redemption_rule_id
            .clone()
            .ok_or_else(|| AppError::ValidationError("Transaction is invalid.".to_string()))?;

        if transaction.is_used {
            return Err(AppError::Conflict(
                "Transaction is already used.".to_string(),
            ));
        }

        // 从未集过章的客户没有卡，不能兑换
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
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer stamp not found.".to_string()))?;

        if card.expiry_date < self.clock.now() {
            return Err(AppError::CampaignExpired {
                expiry_date: card.expiry_date,
            });
        }

        let rule =
            sqlx::query_as::<_, RedemptionRule>("SELECT * FROM redemption_rule WHERE id = ?")
                .bind(&rule_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Redemption rule not found.".to_string()))?;

        if rule.campaign_id != transaction.campaign_id {
            return Err(AppError::PreconditionFailed(
                "Redemption rule is not valid for this campaign.".to_string(),
            ));
        }

        // 门槛含等于：余额恰好达到要求即可兑换
        if card.total_stamps < rule.total_stamps {
            return Err(AppError::PreconditionFailed(format!(
                "You only have {} stamps, which is not enough to redeem \"{}\". ({} stamps required)",
                card.total_stamps, rule.reward_title, rule.total_stamps
            )));
        }

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM redemption WHERE customer_stamp_id = ? AND redemption_rule_id = ?",
        )
        .bind(&card.id)
        .bind(&rule.id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "This reward has already been redeemed.".to_string(),
            ));
        }

        // 核销与兑换记录同一事务；唯一约束兜底并发下的重复兑换
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

        let redemption_id = Uuid::new_v4().to_string();
        let inserted = sqlx::query(
            r#"
            INSERT INTO redemption (id, customer_stamp_id, redemption_rule_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&redemption_id)
        .bind(&card.id)
        .bind(&rule.id)
        .bind(self.clock.now())
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(AppError::Conflict(
                    "This reward has already been redeemed.".to_string(),
                ));
            }
        }
        inserted?;

        tx.commit().await?;

        log::info!(
            "Reward \"{}\" redeemed on card {} via transaction {}",
            rule.reward_title,
            card.id,
            transaction.id
        );

        Ok(RedeemRewardResponse {
            success: true,
            message: format!(
                "The reward \"{}\" has been redeemed successfully.",
                rule.reward_title
            ),
            redemption_id,
            reward_title: rule.reward_title,
            reward_desc: rule.reward_desc,
            customer_stamp_id: card.id,
        })
    }
}
