use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct RedemptionRule {
    pub id: String,
    pub campaign_id: String,
    pub total_stamps: i64,
    pub reward_title: String,
    pub reward_desc: Option<String>,
    pub created_at: DateTime<Utc>,
}
