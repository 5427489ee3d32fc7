//! License server wire types and token decoding.

pub mod models;
pub mod token;
