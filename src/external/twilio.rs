use crate::config::TwilioConfig;
use crate::error::{AppError, AppResult};
use crate::utils::format_e164;
use reqwest::Client;

/// 短信网关。验证码发送走这里，测试用记录式实现替换
pub trait SmsSender: Clone + Send + Sync + 'static {
    fn send_otp(&self, phone: &str, code: &str) -> impl Future<Output = AppResult<()>> + Send;
}

#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioService {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

impl SmsSender for TwilioService {
    async fn send_otp(&self, phone: &str, code: &str) -> AppResult<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let to = format_e164(phone);
        let body = format!("Your Dibs OTP code is {}", code);

        let params = [
            ("To", to.as_str()),
            ("From", self.config.from_phone.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Failed to send OTP: {}", e)))?;

        if response.status().is_success() {
            log::info!("OTP SMS sent successfully: {}", phone);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("OTP SMS failed to send: {}, Error: {}", phone, error_text);
            Err(AppError::ExternalApiError(format!(
                "Failed to send OTP: {}",
                error_text
            )))
        }
    }
}

/// 测试用短信网关：记录发送内容，可模拟发送失败
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockSmsSender {
    pub sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
    pub fail: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MockSmsSender {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sent_codes(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SmsSender for MockSmsSender {
    async fn send_otp(&self, phone: &str, code: &str) -> AppResult<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::ExternalApiError(
                "Failed to send OTP: gateway unavailable".to_string(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}
