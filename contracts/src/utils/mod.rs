//! Common helpers shared by the proxy and its implementations.
pub mod address;
pub mod storage_slot;
