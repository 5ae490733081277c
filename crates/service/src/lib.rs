//! Service layer for credential issuance and verification.
//! - Keeps business rules (hashing, token signing, credential checks) apart from HTTP and SQL.
//! - Persistence goes through the `AuthRepository` trait; `models` supplies the Postgres entity.

pub mod auth;
#[cfg(test)]
pub mod test_support;
