use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// 集章交易，stamp_amount（集章）与 redemption_rule_id（兑换）二选一
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct StampTransaction {
    pub id: String,
    pub campaign_id: String,
    pub stamp_amount: Option<i64>,
    pub redemption_rule_id: Option<String>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub campaign_id: String,
    pub stamp_amount: Option<i64>,
    pub redemption_rule_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
}
