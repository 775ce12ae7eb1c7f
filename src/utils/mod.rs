/// Process-wide logging setup
pub mod logger;
