//! This is a low-level set of contracts implementing an upgradeable proxy
//! pattern: storage stays with the proxy, behavior lives in a swappable
//! implementation reached through `delegate_call`.
use alloy_primitives::Address;
use slot_vm::{ArbResult, CallContext};

pub mod abi;
pub mod erc1967;
pub mod layout;

/// This trait provides a fallback function that delegates all calls to another
/// contract using `delegate_call`. We refer to the second contract as the
/// _implementation_ behind the proxy, and it has to be specified by
/// implementing [`IProxy::implementation`].
///
/// Additionally, delegation to the implementation can be triggered manually
/// through the [`IProxy::do_fallback`] function, or to a different contract
/// through the [`IProxy::delegate`] function.
///
/// The success and return data of the delegated call will be returned back
/// to the caller of the proxy.
pub trait IProxy {
    /// Delegates the current call to `implementation`.
    ///
    /// The implementation's code runs against the proxy's storage with the
    /// proxy's caller as sender. Return data and revert data are relayed
    /// unchanged; on revert every write made by the implementation is
    /// already undone.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Write access to the proxy's state.
    /// * `implementation` - The address of the implementation contract.
    /// * `calldata` - The calldata to delegate to the implementation contract.
    ///
    /// # Errors
    ///
    /// * Revert data of the implementation, unchanged.
    fn delegate(
        &self,
        ctx: &mut CallContext<'_>,
        implementation: Address,
        calldata: &[u8],
    ) -> ArbResult {
        ctx.delegate_call(implementation, calldata)
    }

    /// Returns the address to which the fallback function and
    /// [`IProxy::do_fallback`] should delegate.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Read access to the proxy's state.
    ///
    /// # Errors
    ///
    /// * Revert data if no implementation can be resolved.
    fn implementation(&self, ctx: &CallContext<'_>) -> Result<Address, Vec<u8>>;

    /// Fallback function that delegates calls to the address returned
    /// by [`IProxy::implementation`]. Will run if no other function in the
    /// contract matches the call data.
    ///
    /// The implementation is resolved on every call and never cached.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Write access to the proxy's state.
    /// * `calldata` - The calldata to delegate to the implementation contract.
    ///
    /// # Errors
    ///
    /// * Revert data of [`IProxy::implementation`] or of the implementation.
    fn do_fallback(
        &self,
        ctx: &mut CallContext<'_>,
        calldata: &[u8],
    ) -> ArbResult {
        let implementation = self.implementation(ctx)?;
        self.delegate(ctx, implementation, calldata)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{uint, Address, U256};
    use alloy_sol_macro::sol;
    use alloy_sol_types::{SolCall, SolValue};
    use slot_vm::{
        storage::{StorageAddress, StorageBool, StorageType},
        Contract, Vm,
    };

    use super::*;
    use crate::{
        logic::counter::{
            CounterV1, CounterV3, CounterZeroValue, ICounter, ICounterV3,
        },
        proxy::erc1967::utils::IMPLEMENTATION_SLOT,
    };

    /// Slot of the error switch, far away from any logic slot.
    const ERROR_SLOT: U256 = uint!(
        0x0e1d6b5e0f1f8e27b9fd3a8f1b0a3c5d4e7f6a9b8c7d6e5f4a3b2c1d0e9f8a7b_U256
    );

    sol! {
        function setErrorOnImplementation(bool error_on_implementation)
            external;
        function delegateTo(address target, bytes data) external;
    }

    /// A minimal proxy whose implementation is set once at construction and
    /// whose resolution can be made to fail.
    struct ProxyExample;

    impl ProxyExample {
        fn implementation_slot() -> StorageAddress {
            StorageAddress::new(IMPLEMENTATION_SLOT)
        }

        fn error_on_implementation() -> StorageBool {
            StorageBool::new(ERROR_SLOT)
        }
    }

    impl IProxy for ProxyExample {
        fn implementation(
            &self,
            ctx: &CallContext<'_>,
        ) -> Result<Address, Vec<u8>> {
            if Self::error_on_implementation().get(ctx) {
                return Err("implementation error".abi_encode());
            }
            Ok(Self::implementation_slot().get(ctx))
        }
    }

    impl Contract for ProxyExample {
        fn constructor(
            &self,
            ctx: &mut CallContext<'_>,
            args: &[u8],
        ) -> ArbResult {
            Self::implementation_slot().set(ctx, Address::from_slice(args));
            Ok(Vec::new())
        }

        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            if let Ok(call) =
                setErrorOnImplementationCall::abi_decode(calldata)
            {
                Self::error_on_implementation()
                    .set(ctx, call.error_on_implementation);
                return Ok(Vec::new());
            }
            if let Ok(call) = delegateToCall::abi_decode(calldata) {
                return self.delegate(ctx, call.target, &call.data);
            }
            self.do_fallback(ctx, calldata)
        }
    }

    fn alice() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn setup(vm: &mut Vm) -> (Address, Address) {
        let counter = vm.sender(alice()).deploy(CounterV3, &[]).unwrap();
        let proxy = vm
            .sender(alice())
            .deploy(ProxyExample, counter.as_slice())
            .unwrap();
        (proxy, counter)
    }

    #[test]
    fn constructs() {
        let mut vm = Vm::default();
        let (proxy, counter) = setup(&mut vm);

        assert_eq!(vm.storage(proxy, IMPLEMENTATION_SLOT), counter.into_word());
    }

    #[test]
    fn delegate() {
        let mut vm = Vm::default();
        let (proxy, counter) = setup(&mut vm);

        // verify initial value is 0
        let value_call = ICounterV3::valueCall {}.abi_encode();
        let value = vm.sender(alice()).call(proxy, &value_call).unwrap();
        assert_eq!(value, U256::ZERO.abi_encode());

        let set_call =
            ICounterV3::setValueCall { value: U256::from(1000) }.abi_encode();
        vm.sender(alice())
            .call(proxy, &set_call)
            .expect("should be able to set");

        // the event is emitted by the proxy, not by the implementation
        assert!(vm.emitted(
            proxy,
            &crate::logic::counter::ValueChanged {
                previous: U256::ZERO,
                current: U256::from(1000),
            }
        ));
        assert!(vm.logs().iter().all(|log| log.address != counter));

        let value = vm.sender(alice()).call(proxy, &value_call).unwrap();
        assert_eq!(value, U256::from(1000).abi_encode());

        let writer = vm
            .sender(alice())
            .call(proxy, &ICounterV3::lastWriterCall {}.abi_encode())
            .unwrap();
        assert_eq!(writer, alice().abi_encode());

        // the implementation's own storage is untouched
        assert!(vm.storage(counter, CounterV3::VALUE_SLOT).is_zero());
    }

    #[test]
    fn delegate_returns_error() {
        let mut vm = Vm::default();
        let (proxy, _) = setup(&mut vm);

        let values = vec![U256::from(1), U256::ZERO];
        let call = ICounterV3::setValuesCall { values }.abi_encode();
        let err =
            vm.sender(alice()).call(proxy, &call).expect_err("should revert");

        let zero_value = CounterZeroValue { index: U256::from(1) };
        assert_eq!(err, alloy_sol_types::SolError::abi_encode(&zero_value));
        assert!(vm.storage(proxy, CounterV3::VALUE_SLOT).is_zero());
    }

    #[test]
    fn direct_delegate_to_different_implementation() {
        let mut vm = Vm::default();
        let (proxy, _) = setup(&mut vm);
        let other = vm.sender(alice()).deploy(CounterV1, &[]).unwrap();

        // Write through the other implementation's own storage.
        let set_call =
            ICounter::setValueCall { value: U256::from(500) }.abi_encode();
        vm.sender(alice()).call(other, &set_call).unwrap();

        // A delegated read sees the proxy's storage, not `other`'s.
        let value_call = ICounter::valueCall {}.abi_encode();
        let call = delegateToCall { target: other, data: value_call.into() }
            .abi_encode();
        let value = vm
            .sender(alice())
            .call(proxy, &call)
            .expect("should be able to delegate to different implementation");

        assert_eq!(value, U256::ZERO.abi_encode());
    }

    #[test]
    fn fallback_reverts_on_implementation_error() {
        let mut vm = Vm::default();
        let (proxy, _) = setup(&mut vm);
        vm.sender(alice())
            .call(
                proxy,
                &setErrorOnImplementationCall { error_on_implementation: true }
                    .abi_encode(),
            )
            .unwrap();

        let value_call = ICounterV3::valueCall {}.abi_encode();
        let err = vm
            .sender(alice())
            .call(proxy, &value_call)
            .expect_err("should fail when implementation cannot be resolved");

        assert_eq!(err, "implementation error".abi_encode());
    }
}
