//! Helper for reading and writing primitive types to specific storage slots.
use alloy_primitives::U256;
use slot_vm::storage::StorageType;

/// Helper for reading and writing primitive types to specific storage slots.
///
/// Storage slots are often used to avoid storage conflict when dealing with
/// upgradeable contracts. This library helps with reading and writing to such
/// slots without the need for low-level operations.
///
/// The functions in this library return appropriate storage types that expose
/// `get` and `set` against the running frame.
///
/// Example usage to set ERC-1967 implementation slot:
///
/// ```rust
/// use alloy_primitives::{uint, Address, U256};
/// use slot_vm::{storage::StorageAddress, CallContext};
/// use upgradeable_proxy::utils::storage_slot::StorageSlot;
///
/// const IMPLEMENTATION_SLOT: U256 = uint!(
///     0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc_U256
/// );
///
/// fn get_implementation(ctx: &CallContext<'_>) -> Address {
///     StorageSlot::get_slot::<StorageAddress>(IMPLEMENTATION_SLOT).get(ctx)
/// }
/// ```
pub struct StorageSlot;

impl StorageSlot {
    /// Returns a [`StorageType`] located at `slot`.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot to get the value from.
    #[must_use]
    pub fn get_slot<ST: StorageType>(slot: impl Into<U256>) -> ST {
        ST::new(slot.into())
    }
}
