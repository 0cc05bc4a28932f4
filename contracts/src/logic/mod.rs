//! Implementations that can sit behind an [`Erc1967Proxy`].
//!
//! An implementation never owns the storage it manipulates: behind a proxy
//! its code runs against the proxy's slots. What it does own is the meaning
//! it assigns to those slots, declared through
//! [`LogicModule::storage_layout`] so an upgrade can be checked before it is
//! sent.
//!
//! [`Erc1967Proxy`]: crate::proxy::erc1967::Erc1967Proxy
use alloy_primitives::U256;
use alloy_sol_types::SolError;
pub use sol::*;
use slot_vm::Contract;

use crate::proxy::layout::StorageLayout;

pub mod counter;

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// The calldata does not start with a selector this implementation
        /// knows.
        ///
        /// * `selector` - First four bytes of the calldata, zero padded.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error LogicUnknownSelector(bytes4 selector);
    }
}

/// Behavior that can be installed behind a proxy.
pub trait LogicModule: Contract {
    /// Gets the slots this implementation reads and writes, in slot order.
    fn storage_layout(&self) -> StorageLayout;

    /// Gets the slot index of the variable `name`.
    ///
    /// # Arguments
    ///
    /// * `&self` - The implementation.
    /// * `name` - Variable name as declared in [`Self::storage_layout`].
    fn slot_of(&self, name: &str) -> Option<U256> {
        self.storage_layout().position(name)
    }
}

/// Revert data for calldata that matched no known selector.
pub(crate) fn unknown_selector(calldata: &[u8]) -> Vec<u8> {
    let mut selector = [0u8; 4];
    let len = calldata.len().min(4);
    selector[..len].copy_from_slice(&calldata[..len]);
    LogicUnknownSelector { selector: selector.into() }.abi_encode()
}
