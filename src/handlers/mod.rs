pub mod otp;
pub mod stamp;
pub mod transaction;

pub use otp::otp_config;
pub use stamp::stamp_config;
pub use transaction::transaction_config;
