pub mod auth;
pub mod integrations;
pub mod server;
