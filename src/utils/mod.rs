pub mod error;
pub mod extra_keys;
pub mod logger;
pub mod validation;
