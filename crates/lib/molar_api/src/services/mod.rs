//! Business logic behind the handlers.

pub mod auth;
pub mod patients;
pub mod users;
