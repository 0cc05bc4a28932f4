//! Three versions of a counter implementation, meant to be installed one
//! after the other behind the same proxy.
//!
//! * [`CounterV1`] stores what it is given.
//! * [`CounterV2`] keeps the layout and stores twice what it is given.
//! * [`CounterV3`] appends two slots, counting writes and remembering the
//!   last writer, and adds a batch setter.
use alloy_primitives::{uint, Address, U256};
use alloy_sol_types::{SolError, SolInterface, SolValue};
pub use sol::*;
use slot_vm::{
    storage::{StorageAddress, StorageU256},
    ArbResult, CallContext, Contract,
};

use super::{unknown_selector, LogicModule};
use crate::{
    proxy::layout::{SlotType, StorageLayout},
    utils::storage_slot::StorageSlot,
};

mod sol {
    #![allow(missing_docs)]

    use alloy_sol_macro::sol;

    sol! {
        /// Interface shared by `CounterV1` and `CounterV2`.
        interface ICounter {
            function setValue(uint256 value) external;
            function value() external view returns (uint256);
        }

        /// Interface of `CounterV3`.
        interface ICounterV3 {
            function setValue(uint256 value) external;
            function setValues(uint256[] values) external;
            function value() external view returns (uint256);
            function updates() external view returns (uint256);
            function lastWriter() external view returns (address);
        }
    }

    sol! {
        /// Emitted when the stored value changes.
        ///
        /// * `previous` - Value before the write.
        /// * `current` - Value after the write.
        #[derive(Debug)]
        event ValueChanged(uint256 previous, uint256 current);
    }

    sol! {
        /// A batch contained a zero entry.
        ///
        /// * `index` - Position of the zero entry.
        #[derive(Debug)]
        error CounterZeroValue(uint256 index);

        /// The value to store does not fit in a `uint256`.
        ///
        /// * `value` - The input that overflowed.
        #[derive(Debug)]
        error CounterOverflow(uint256 value);
    }
}

use ICounter::ICounterCalls;
use ICounterV3::ICounterV3Calls;

/// Writes `current` to the value slot and logs the change.
fn store_value(ctx: &mut CallContext<'_>, slot: U256, current: U256) {
    let value = StorageSlot::get_slot::<StorageU256>(slot);
    let previous = value.get(ctx);
    value.set(ctx, current);
    ctx.emit(&ValueChanged { previous, current });
}

/// Reads the value slot, ABI encoded.
fn load_value(ctx: &CallContext<'_>, slot: U256) -> Vec<u8> {
    StorageSlot::get_slot::<StorageU256>(slot).get(ctx).abi_encode()
}

/// First version: `value` at slot 0, stored as given.
#[derive(Clone, Copy, Debug, Default)]
pub struct CounterV1;

impl CounterV1 {
    /// Slot of `value`.
    pub const VALUE_SLOT: U256 = U256::ZERO;
}

impl Contract for CounterV1 {
    fn name(&self) -> &'static str {
        "CounterV1"
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> ArbResult {
        let Ok(call) = ICounterCalls::abi_decode(calldata) else {
            return Err(unknown_selector(calldata));
        };

        match call {
            ICounterCalls::setValue(call) => {
                store_value(ctx, Self::VALUE_SLOT, call.value);
                Ok(Vec::new())
            }
            ICounterCalls::value(_) => {
                Ok(load_value(ctx, Self::VALUE_SLOT))
            }
        }
    }
}

impl LogicModule for CounterV1 {
    fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new().with("value", SlotType::Uint256)
    }
}

/// Second version: same layout as [`CounterV1`], `setValue` stores twice
/// its input.
#[derive(Clone, Copy, Debug, Default)]
pub struct CounterV2;

impl CounterV2 {
    /// Slot of `value`.
    pub const VALUE_SLOT: U256 = U256::ZERO;
}

impl Contract for CounterV2 {
    fn name(&self) -> &'static str {
        "CounterV2"
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> ArbResult {
        let Ok(call) = ICounterCalls::abi_decode(calldata) else {
            return Err(unknown_selector(calldata));
        };

        match call {
            ICounterCalls::setValue(call) => {
                let doubled = call
                    .value
                    .checked_mul(uint!(2_U256))
                    .ok_or(CounterOverflow { value: call.value }.abi_encode())?;
                store_value(ctx, Self::VALUE_SLOT, doubled);
                Ok(Vec::new())
            }
            ICounterCalls::value(_) => {
                Ok(load_value(ctx, Self::VALUE_SLOT))
            }
        }
    }
}

impl LogicModule for CounterV2 {
    fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new().with("value", SlotType::Uint256)
    }
}

/// Third version: extends the layout with `updates` and `lastWriter`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CounterV3;

impl CounterV3 {
    /// Slot of `value`, unchanged since [`CounterV1`].
    pub const VALUE_SLOT: U256 = U256::ZERO;
    /// Slot of `updates`.
    pub const UPDATES_SLOT: U256 = uint!(1_U256);
    /// Slot of `lastWriter`.
    pub const LAST_WRITER_SLOT: U256 = uint!(2_U256);

    fn updates() -> StorageU256 {
        StorageSlot::get_slot(Self::UPDATES_SLOT)
    }

    fn last_writer() -> StorageAddress {
        StorageSlot::get_slot(Self::LAST_WRITER_SLOT)
    }

    /// Stores one value and records who wrote it.
    fn write(ctx: &mut CallContext<'_>, value: U256, writer: Address) {
        store_value(ctx, Self::VALUE_SLOT, value);
        let updates = Self::updates().get(ctx);
        Self::updates().set(ctx, updates + uint!(1_U256));
        Self::last_writer().set(ctx, writer);
    }
}

impl Contract for CounterV3 {
    fn name(&self) -> &'static str {
        "CounterV3"
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> ArbResult {
        let Ok(call) = ICounterV3Calls::abi_decode(calldata) else {
            return Err(unknown_selector(calldata));
        };

        let writer = ctx.msg_sender();
        match call {
            ICounterV3Calls::setValue(call) => {
                Self::write(ctx, call.value, writer);
                Ok(Vec::new())
            }
            ICounterV3Calls::setValues(call) => {
                for (index, value) in call.values.into_iter().enumerate() {
                    // Earlier entries are already written. The revert
                    // undoes them.
                    if value.is_zero() {
                        return Err(CounterZeroValue { index: U256::from(index) }
                            .abi_encode());
                    }
                    Self::write(ctx, value, writer);
                }
                Ok(Vec::new())
            }
            ICounterV3Calls::value(_) => {
                Ok(load_value(ctx, Self::VALUE_SLOT))
            }
            ICounterV3Calls::updates(_) => {
                Ok(Self::updates().get(ctx).abi_encode())
            }
            ICounterV3Calls::lastWriter(_) => {
                Ok(Self::last_writer().get(ctx).abi_encode())
            }
        }
    }
}

impl LogicModule for CounterV3 {
    fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new()
            .with("value", SlotType::Uint256)
            .with("updates", SlotType::Uint256)
            .with("lastWriter", SlotType::Address)
    }
}
