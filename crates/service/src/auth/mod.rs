//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and bearer-token checks live here, together with the
//! token codec and password hasher they depend on.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use errors::{AuthError, ErrorClass};
pub use service::{AuthConfig, AuthService};
