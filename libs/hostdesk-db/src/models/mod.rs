pub mod catalog;
pub mod country;
pub mod invoice;
pub mod order;
pub mod referral;
pub mod server;
pub mod ticket;
pub mod user;
