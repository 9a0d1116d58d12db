pub mod catalog_repo;
pub mod country_repo;
pub mod invoice_repo;
pub mod order_repo;
pub mod referral_repo;
pub mod server_repo;
pub mod ticket_repo;
pub mod user_repo;
