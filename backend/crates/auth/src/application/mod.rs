pub mod config;
pub mod delivery;
pub mod login_payload;
pub mod session;
pub mod token;
pub mod verify;
