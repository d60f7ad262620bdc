pub mod error;
pub mod extract;
pub mod monitor;
pub mod retry;
pub mod validate;
