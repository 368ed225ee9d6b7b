//! Infrastructure Layer
//!
//! Database implementations and identity provider integrations.

pub mod google;
pub mod openid;
pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use google::GoogleHandshake;
pub use openid::OpenidHandshake;
pub use postgres::PgAuthRepository;
