pub mod api_errors;
pub mod notify;
pub mod signature;
pub mod webhook;
