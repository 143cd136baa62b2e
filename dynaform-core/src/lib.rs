pub mod collaborators;
pub mod common;
pub mod database;
pub mod errors;
pub mod form_types;
pub mod services;
