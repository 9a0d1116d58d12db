pub mod catalog;
pub mod countries;
pub mod orders;
pub mod referrals;
pub mod settings;
pub mod tickets;
pub mod users;
