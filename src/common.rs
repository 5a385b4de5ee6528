pub mod error;
pub mod lenient;

pub use error::{CoreError, Result};
