use chrono::Duration;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::external::SmsSender;
use crate::models::*;
use crate::utils::{Clock, generate_six_digit_code, validate_phone};

// 验证码有效期与重发间隔
const OTP_TTL_SECONDS: i64 = 300;
const RESEND_COOLDOWN_SECONDS: i64 = 30;

/// 验证码签发与校验。每个客户同时只有一条验证码，验证成功即作废
#[derive(Clone)]
pub struct OtpService<S: SmsSender, C: Clock> {
    pool: DbPool,
    sms: S,
    clock: C,
}

impl<S: SmsSender, C: Clock> OtpService<S, C> {
    pub fn new(pool: DbPool, sms: S, clock: C) -> Self {
        Self { pool, sms, clock }
    }

    pub async fn send_otp(&self, phone: &str) -> AppResult<OtpMessageResponse> {
        validate_phone(phone)?;

        let customer = self.find_customer(phone).await?;

        let now = self.clock.now();
        let otp_code = generate_six_digit_code();
        let expired_at = now + Duration::seconds(OTP_TTL_SECONDS);
        let cooldown_cutoff = now - Duration::seconds(RESEND_COOLDOWN_SECONDS);

        // 写入与发送放在同一事务：短信发送失败则回滚，不留下未送达的验证码。
        // 重发间隔用条件 upsert 收口，两次并发重发不会都绕过 30 秒限制
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            r#"
            INSERT INTO customer_otp (customer_id, otp_code, created_at, expired_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (customer_id) DO UPDATE SET
                otp_code = excluded.otp_code,
                created_at = excluded.created_at,
                expired_at = excluded.expired_at
            WHERE customer_otp.created_at <= ?
            "#,
        )
        .bind(&customer.id)
        .bind(&otp_code)
        .bind(now)
        .bind(expired_at)
        .bind(cooldown_cutoff)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::RateLimited(
                "Please wait before resending OTP.".to_string(),
            ));
        }

        self.sms.send_otp(phone, &otp_code).await?;

        tx.commit().await?;

        Ok(OtpMessageResponse {
            message: "OTP sent successfully".to_string(),
        })
    }

    pub async fn verify_otp(&self, phone: &str, otp_code: &str) -> AppResult<OtpMessageResponse> {
        validate_phone(phone)?;

        let customer = self.find_customer(phone).await?;

        let record =
            sqlx::query_as::<_, CustomerOtp>("SELECT * FROM customer_otp WHERE customer_id = ?")
                .bind(&customer.id)
                .fetch_optional(&self.pool)
                .await?;

        let record =
            record.ok_or_else(|| AppError::NotFound("OTP record not found".to_string()))?;

        if self.clock.now() > record.expired_at {
            return Err(AppError::PreconditionFailed(
                "OTP code is expired".to_string(),
            ));
        }

        if record.otp_code != otp_code {
            return Err(AppError::PreconditionFailed("Invalid OTP code".to_string()));
        }

        // 验证通过即删除，验证码一次性
        sqlx::query("DELETE FROM customer_otp WHERE customer_id = ?")
            .bind(&customer.id)
            .execute(&self.pool)
            .await?;

        Ok(OtpMessageResponse {
            message: "OTP verified successfully".to_string(),
        })
    }

    async fn find_customer(&self, phone: &str) -> AppResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customer WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        customer.ok_or_else(|| AppError::NotFound("Phone number not found.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::external::MockSmsSender;
    use crate::services::test_support::{PHONE, clock as fixed_clock, seed_customer};
    use crate::utils::FixedClock;

    async fn setup() -> (OtpService<MockSmsSender, FixedClock>, MockSmsSender, FixedClock) {
        let pool = test_pool().await;
        seed_customer(&pool, PHONE).await;
        let sms = MockSmsSender::default();
        let clock = fixed_clock();
        (
            OtpService::new(pool, sms.clone(), clock.clone()),
            sms,
            clock,
        )
    }

    #[tokio::test]
    async fn test_send_and_verify_deletes_code() {
        let (service, sms, _clock) = setup().await;

        service.send_otp(PHONE).await.unwrap();
        let (_, code) = sms.sent_codes().pop().unwrap();

        service.verify_otp(PHONE, &code).await.unwrap();

        // 同一验证码不能二次使用
        assert!(matches!(
            service.verify_otp(PHONE, &code).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resend_within_cooldown_is_rate_limited() {
        let (service, sms, clock) = setup().await;

        service.send_otp(PHONE).await.unwrap();
        let (_, first_code) = sms.sent_codes().pop().unwrap();

        clock.advance(Duration::seconds(10));
        assert!(matches!(
            service.send_otp(PHONE).await,
            Err(AppError::RateLimited(_))
        ));

        // 原验证码未被覆盖，仍然可用
        service.verify_otp(PHONE, &first_code).await.unwrap();
    }

    #[tokio::test]
    async fn test_resend_after_cooldown_replaces_code() {
        let (service, sms, clock) = setup().await;

        service.send_otp(PHONE).await.unwrap();
        let (_, first_code) = sms.sent_codes().pop().unwrap();

        clock.advance(Duration::seconds(31));
        service.send_otp(PHONE).await.unwrap();
        let (_, second_code) = sms.sent_codes().pop().unwrap();

        if first_code != second_code {
            assert!(matches!(
                service.verify_otp(PHONE, &first_code).await,
                Err(AppError::PreconditionFailed(_))
            ));
        }
        service.verify_otp(PHONE, &second_code).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let (service, sms, clock) = setup().await;

        service.send_otp(PHONE).await.unwrap();
        let (_, code) = sms.sent_codes().pop().unwrap();

        clock.advance(Duration::seconds(OTP_TTL_SECONDS + 1));
        assert!(matches!(
            service.verify_otp(PHONE, &code).await,
            Err(AppError::PreconditionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_code_rejected() {
        let (service, sms, _clock) = setup().await;

        service.send_otp(PHONE).await.unwrap();
        let (_, code) = sms.sent_codes().pop().unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert!(matches!(
            service.verify_otp(PHONE, wrong).await,
            Err(AppError::PreconditionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_phone_rejected_before_lookup() {
        let (service, _sms, _clock) = setup().await;

        assert!(matches!(
            service.send_otp("+6591234567").await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.verify_otp("not-a-phone", "123456").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_phone_not_provisioned() {
        let (service, _sms, _clock) = setup().await;

        assert!(matches!(
            service.send_otp("6598765432").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_no_code() {
        let (service, sms, _clock) = setup().await;

        sms.set_fail(true);
        assert!(matches!(
            service.send_otp(PHONE).await,
            Err(AppError::ExternalApiError(_))
        ));

        // 发送失败时验证码写入已回滚
        sms.set_fail(false);
        assert!(matches!(
            service.verify_otp(PHONE, "123456").await,
            Err(AppError::NotFound(_))
        ));
    }
}
