use crate::error::{AppError, AppResult};
use regex::Regex;

/// 验证手机号格式：不带 + 的 E.164 数字串（如 6591234567）
pub fn validate_phone(phone: &str) -> AppResult<()> {
    let phone_regex = Regex::new(r"^[1-9]\d{7,14}$").unwrap();

    if !phone_regex.is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format.".to_string(),
        ));
    }

    Ok(())
}

/// 转为带 + 的 E.164，发送短信时使用
pub fn format_e164(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{}", digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("6591234567").is_ok());
        assert!(validate_phone("12345678901").is_ok());
        assert!(validate_phone("0591234567").is_err());
        assert!(validate_phone("1234567").is_err());
        assert!(validate_phone("+6591234567").is_err());
        assert!(validate_phone("65912e4567").is_err());
    }

    #[test]
    fn test_format_e164() {
        assert_eq!(format_e164("6591234567"), "+6591234567");
        assert_eq!(format_e164("65 9123 4567"), "+6591234567");
    }
}
