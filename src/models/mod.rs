pub mod campaign;
pub mod customer;
pub mod customer_otp;
pub mod customer_stamp;
pub mod redemption;
pub mod stamp_transaction;

pub use campaign::*;
pub use customer::*;
pub use customer_otp::*;
pub use customer_stamp::*;
pub use redemption::*;
pub use stamp_transaction::*;
