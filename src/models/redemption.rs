use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Redemption {
    pub id: String,
    pub customer_stamp_id: String,
    pub redemption_rule_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemRewardRequest {
    pub transaction_id: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemRewardResponse {
    pub success: bool,
    pub message: String,
    pub redemption_id: String,
    pub reward_title: String,
    pub reward_desc: Option<String>,
    pub customer_stamp_id: String,
}
