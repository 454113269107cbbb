//! Authentication layer: OAuth2 client-credentials session and best-effort
//! tenant discovery from the access token.
//!
//! - [`token`]: [`TokenManager`], the single owner of the cached session
//! - [`jwt`]: unverified payload decode and organization claim lookup

pub mod jwt;
pub mod token;

pub use token::{Clock, Credentials, ManualClock, SystemClock, TokenManager, EXPIRY_MARGIN_SECS};
