pub mod server_settings;
pub mod session;
pub mod user;
