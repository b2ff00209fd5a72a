pub mod config;
pub mod error;
pub mod terminal;
pub mod token;

pub use error::{AppError, Result};
