pub mod mail;
pub mod referrals;
