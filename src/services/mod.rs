pub mod otp_service;
#[cfg(test)]
pub mod test_support;
pub mod redemption_service;
pub mod stamp_service;
pub mod transaction_service;

pub use otp_service::*;
pub use redemption_service::*;
pub use stamp_service::*;
pub use transaction_service::*;

use crate::external::TwilioService;
use crate::utils::SystemClock;

// 生产环境使用的具体服务类型，handler 直接引用
pub type AppTransactionService = TransactionService<SystemClock>;
pub type AppOtpService = OtpService<TwilioService, SystemClock>;
pub type AppStampService = StampService<SystemClock>;
pub type AppRedemptionService = RedemptionService<SystemClock>;
