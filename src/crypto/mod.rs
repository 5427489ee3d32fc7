//! Request canonicalization and HMAC signing.

pub mod canonical;
pub mod mac;
pub mod signing;
