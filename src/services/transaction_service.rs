use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::Clock;
use uuid::Uuid;

/// 交易创建：员工在后台为活动开出一笔集章或兑换交易
#[derive(Clone)]
pub struct TransactionService<C: Clock> {
    pool: DbPool,
    clock: C,
}

impl<C: Clock> TransactionService<C> {
    pub fn new(pool: DbPool, clock: C) -> Self {
        Self { pool, clock }
    }

    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> AppResult<CreateTransactionResponse> {
        // stamp_amount 与 redemption_rule_id 必须恰好提供一个
        if request.campaign_id.is_empty()
            || (request.stamp_amount.is_none() && request.redemption_rule_id.is_none())
            || (request.stamp_amount.is_some() && request.redemption_rule_id.is_some())
        {
            return Err(AppError::ValidationError("Invalid request body".to_string()));
        }

        let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaign WHERE id = ?")
            .bind(&request.campaign_id)
            .fetch_optional(&self.pool)
            .await?;

        let campaign =
            campaign.ok_or_else(|| AppError::NotFound("Campaign not found.".to_string()))?;

        // 过期检查先于规则/数量校验，过期活动始终先报过期
        if campaign.expiry_date < self.clock.now() {
            return Err(AppError::CampaignExpired {
                expiry_date: campaign.expiry_date,
            });
        }

        if let Some(rule_id) = &request.redemption_rule_id {
            let rule =
                sqlx::query_as::<_, RedemptionRule>("SELECT * FROM redemption_rule WHERE id = ?")
                    .bind(rule_id)
                    .fetch_optional(&self.pool)
                    .await?;

            let rule =
                rule.ok_or_else(|| AppError::NotFound("Redemption rule not found.".to_string()))?;

            if rule.campaign_id != campaign.id {
                return Err(AppError::PreconditionFailed(
                    "Redemption rule is not valid for this campaign.".to_string(),
                ));
            }
        }

        if let Some(amount) = request.stamp_amount {
            if amount <= 0 {
                return Err(AppError::ValidationError(
                    "The stamp amount is invalid.".to_string(),
                ));
            }
        }

        let transaction_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO stamp_transaction (id, campaign_id, stamp_amount, redemption_rule_id, is_used, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&transaction_id)
        .bind(&campaign.id)
        .bind(request.stamp_amount)
        .bind(&request.redemption_rule_id)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;

        log::info!(
            "Stamp transaction created: {} (campaign {})",
            transaction_id,
            campaign.id
        );

        Ok(CreateTransactionResponse {
            success: true,
            message: "The transaction has been created successfully.".to_string(),
            transaction_id,
        })
    }
}
