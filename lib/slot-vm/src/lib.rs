//! # slot-vm - In-memory execution host for upgradeable contracts
//!
//! This crate runs contracts written as plain Rust against an EVM-shaped
//! state model: every account owns a `U256 -> B256` slot map, calls are
//! executed in frames, and a frame can either `call` another account (its
//! own storage) or `delegate_call` it (the caller's storage, the caller's
//! `msg_sender`).
//!
//! Each frame is checkpointed. When code returns `Err`, every storage write,
//! account creation and log produced inside the frame is rolled back before
//! the revert data is handed to the caller, so a unit of work is
//! all-or-nothing.
//!
//! ## Usage
//!
//! ```rust
//! use alloy_primitives::{Address, B256, U256};
//! use slot_vm::{ArbResult, CallContext, Contract, Vm};
//!
//! struct Store;
//!
//! impl Contract for Store {
//!     fn call(
//!         &self,
//!         ctx: &mut CallContext<'_>,
//!         calldata: &[u8],
//!     ) -> ArbResult {
//!         ctx.sstore(U256::ZERO, B256::left_padding_from(calldata));
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let alice = Address::repeat_byte(0xA1);
//! let mut vm = Vm::default();
//! let store = vm.sender(alice).deploy(Store, &[]).expect("should deploy");
//!
//! vm.sender(alice).call(store, &[7]).expect("should store");
//! assert_eq!(vm.storage(store, U256::ZERO), B256::with_last_byte(7));
//! ```
#![deny(rustdoc::broken_intra_doc_links)]

mod context;
mod contract;
mod environment;
mod journal;
pub mod storage;
mod vm;

pub use context::CallContext;
pub use contract::{ArbResult, Contract};
pub use environment::Environment;
pub use vm::{Sender, Vm, VmCallDepthExceeded};
