pub mod availability;
pub mod error;
pub mod resolver;
