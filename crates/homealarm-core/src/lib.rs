//! Home alarm core: domain types, the alarm decision table, and the service
//! that applies decisions through a repository.

pub mod domain;
pub mod engine;
pub mod repository;
pub mod image;
pub mod listener;
pub mod service;
pub mod config;
pub mod validation;

pub use domain::*;
pub use engine::*;
pub use repository::*;
pub use image::*;
pub use listener::*;
pub use service::*;
pub use self::config::*;
pub use validation::*;

#[cfg(test)]
mod tests_service;
#[cfg(test)]
mod tests_config;
