pub mod bgzf;
pub mod chunking;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod gather;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
