pub mod donation_repo;
pub mod event_repo;
pub mod lookup_repo;
pub mod notify_repo;
pub mod receipt_repo;
pub mod sponsorship_repo;
