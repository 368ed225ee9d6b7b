//! Platform - Cross-cutting infrastructure primitives
//!
//! Shared building blocks with no domain knowledge:
//! - `crypto` - random secrets, hashing, HMAC signing, base64
//! - `cookie` - Set-Cookie construction and Cookie header extraction
//! - `password` - opaque password digest creation and verification

pub mod cookie;
pub mod crypto;
pub mod password;
