//! Credential models: redacted secrets and the cached access token.

pub mod token;

pub use token::{cached::*, secret::*};
