pub mod donation;
pub mod pipeline;
pub mod receipt;
pub mod recurring;
pub mod sponsorship;
pub mod worker;
