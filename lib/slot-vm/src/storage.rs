//! Typed views over single storage slots.
//!
//! A handle only remembers its slot index. Reads and writes go through the
//! [`CallContext`] of the running frame, so the same handle addresses
//! different accounts depending on who executes it.
use alloy_primitives::{Address, B256, U256};

use crate::CallContext;

/// A value that lives in exactly one storage slot.
pub trait StorageType: Sized {
    /// Creates a handle for `slot`.
    fn new(slot: U256) -> Self;

    /// Gets the slot this handle points at.
    fn slot(&self) -> U256;
}

macro_rules! storage_word {
    ($(#[$attr:meta])* $name:ident, $ty:ty, $decode:expr, $encode:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            slot: U256,
        }

        impl StorageType for $name {
            fn new(slot: U256) -> Self {
                Self { slot }
            }

            fn slot(&self) -> U256 {
                self.slot
            }
        }

        impl $name {
            /// Reads the value from the current frame's storage.
            #[must_use]
            pub fn get(&self, ctx: &CallContext<'_>) -> $ty {
                let decode: fn(B256) -> $ty = $decode;
                decode(ctx.sload(self.slot))
            }

            /// Writes `value` to the current frame's storage.
            pub fn set(&self, ctx: &mut CallContext<'_>, value: $ty) {
                let encode: fn($ty) -> B256 = $encode;
                ctx.sstore(self.slot, encode(value));
            }
        }
    };
}

storage_word!(
    /// A `uint256` slot.
    StorageU256,
    U256,
    |word| U256::from_be_bytes(word.0),
    |value| B256::from(value.to_be_bytes::<32>())
);

storage_word!(
    /// An `address` slot, right aligned like the EVM stores it.
    StorageAddress,
    Address,
    |word| Address::from_word(word),
    |value| value.into_word()
);

storage_word!(
    /// A `bool` slot.
    StorageBool,
    bool,
    |word| !word.is_zero(),
    |value| if value { B256::with_last_byte(1) } else { B256::ZERO }
);

storage_word!(
    /// A raw `bytes32` slot.
    StorageB256,
    B256,
    |word| word,
    |value| value
);

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256, U256};

    use super::*;
    use crate::{ArbResult, Contract, Vm};

    struct Roundtrip;

    impl Contract for Roundtrip {
        fn call(&self, ctx: &mut CallContext<'_>, _: &[u8]) -> ArbResult {
            let number = StorageU256::new(U256::from(0));
            let owner = StorageAddress::new(U256::from(1));
            let flag = StorageBool::new(U256::from(2));

            number.set(ctx, U256::from(1234));
            owner.set(ctx, Address::repeat_byte(0x11));
            flag.set(ctx, true);

            assert_eq!(number.get(ctx), U256::from(1234));
            assert_eq!(owner.get(ctx), Address::repeat_byte(0x11));
            assert!(flag.get(ctx));
            Ok(Vec::new())
        }
    }

    #[test]
    fn words_are_encoded_like_the_evm() {
        let alice = Address::repeat_byte(0xA1);
        let mut vm = Vm::default();
        let contract = vm.sender(alice).deploy(Roundtrip, &[]).unwrap();

        vm.sender(alice).call(contract, &[]).expect("should roundtrip");

        assert_eq!(
            vm.storage(contract, U256::from(0)),
            B256::left_padding_from(&[0x04, 0xd2])
        );
        assert_eq!(
            vm.storage(contract, U256::from(1)),
            Address::repeat_byte(0x11).into_word()
        );
        assert_eq!(
            vm.storage(contract, U256::from(2)),
            B256::with_last_byte(1)
        );
    }

    #[test]
    fn unset_slots_read_as_zero() {
        let alice = Address::repeat_byte(0xA1);
        let vm = Vm::default();
        assert_eq!(vm.storage(alice, U256::from(99)), B256::ZERO);
    }
}
