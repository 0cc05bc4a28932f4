//! Contracts implementing access control mechanisms.
pub mod admin;
