//! Value Object Module

pub mod auth_method;
pub mod email;
pub mod user_id;
pub mod user_type;
pub mod username;
