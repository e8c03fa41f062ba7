//! `clinic-core` — configuration and error types shared by the clinic crates.

pub mod config;
pub mod error;

pub use config::ClinicConfig;
pub use error::{ClinicError, Result};
