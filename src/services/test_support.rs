//! 服务层测试共用的种子数据与固定时钟

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::database::DbPool;
use crate::utils::FixedClock;

pub const PHONE: &str = "6591234567";

pub fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
}

pub async fn seed_campaign(pool: &DbPool, id: &str, expiry: DateTime<Utc>) {
    sqlx::query("INSERT INTO campaign (id, name, expiry_date, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind("Coffee Club")
        .bind(expiry)
        .bind(expiry - Duration::days(30))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_customer(pool: &DbPool, phone: &str) {
    sqlx::query("INSERT INTO customer (id, phone, created_at) VALUES (?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(phone)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_rule(pool: &DbPool, id: &str, campaign_id: &str, total_stamps: i64) {
    sqlx::query(
        r#"
        INSERT INTO redemption_rule (id, campaign_id, total_stamps, reward_title, reward_desc, created_at)
        VALUES (?, ?, ?, 'Free Fries', 'One portion of fries', ?)
        "#,
    )
    .bind(id)
    .bind(campaign_id)
    .bind(total_stamps)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
}
