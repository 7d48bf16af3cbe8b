pub mod donation;
pub mod error;
pub mod event;
pub mod identity;
pub mod mode;
pub mod money;
pub mod receipt;
pub mod sponsorship;
pub mod stripe;
