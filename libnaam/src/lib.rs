//! NAAM - client library for the NAAM coconut cooperative
//!
//! Typed access to the cooperative's REST backend plus the logic the
//! mobile screens carry: OTP login, profile completion, land and bank
//! forms, the location cascade, collections and payments, prices and the
//! home feed.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use api::{ActionOutcome, ApiClient, ApiResult};
pub use config::Config;
pub use error::{ApiError, NaamError, Result};
pub use service::{NaamService, Navigation};
pub use session::{SessionInfo, SessionManager};
pub use types::{UserProfile, UserRole};
