//! API handlers and shared request plumbing.
//!
//! Resource modules (`accounts`, `clinical`) follow the same split: `types`
//! for payloads and `OpenAPI` schemas, `validate` for field checks, `storage`
//! for SQL, and thin handler functions on top.

pub mod accounts;
pub mod auth;
pub mod clinical;
pub mod error;
pub mod fields;
pub mod health;
pub mod validation;

pub use self::error::ApiError;
pub use self::health::health;
