//! # dexbridge Config
//!
//! Configuration for the command bridge, its connection endpoint and the two
//! front-ends that call into it.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
