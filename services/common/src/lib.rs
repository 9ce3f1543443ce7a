//! Common constants, error types and time helpers shared by the transaction services

pub mod constants;
pub mod errors;
pub mod time;

pub use constants::*;
pub use errors::*;
pub use time::*;
