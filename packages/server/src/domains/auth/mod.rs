//! Auth domain - verifies identity-provider JWTs
//!
//! Sign-in itself happens at the identity provider. This service only checks
//! the bearer token and extracts the user id and email.

pub mod jwt;

pub use jwt::{Claims, JwtService};
