use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct CustomerStamp {
    pub id: String,
    pub customer_id: String,
    pub campaign_id: String,
    pub total_stamps: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectStampsRequest {
    pub transaction_id: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollectStampsResponse {
    pub success: bool,
    pub new_total_stamps: i64,
    pub is_expired: bool,
    pub expiry_date: DateTime<Utc>,
    pub message: String,
    pub customer_stamp_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StampCardQuery {
    pub customer_stamp_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StampCardReward {
    pub id: String,
    pub total_stamps: i64,
    pub reward_title: String,
    pub reward_desc: Option<String>,
    pub is_redeemed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StampCardResponse {
    pub total_stamps: i64,
    pub is_expired: bool,
    pub expiry_date: DateTime<Utc>,
    pub rewards: Vec<StampCardReward>,
}
