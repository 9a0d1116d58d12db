pub mod commission;
pub mod commission_service;
pub mod order_service;
pub mod payment;
pub mod pricing;
pub mod referral_service;
pub mod user_service;
