//! A collection of utilities for working with [`Address`].
use alloy_primitives::Address;
use alloy_sol_types::SolError;
pub use sol::*;
use slot_vm::{ArbResult, CallContext};

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// There's no code at `target` (it is not a contract).
        ///
        /// * `target` - Address of the target contract.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error AddressEmptyCode(address target);

        /// A call to an address target failed. The target may have reverted
        /// without a revert reason.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error FailedCall();
    }
}

/// An [`AddressUtils`] error.
#[derive(Debug)]
pub enum Error {
    /// There's no code at `target` (it is not a contract).
    EmptyCode(AddressEmptyCode),
    /// A call to an address target failed. The target may have reverted
    /// without a revert reason.
    FailedCall(FailedCall),
    /// The target reverted with a reason, which is bubbled up unchanged.
    Revert(Vec<u8>),
}

impl From<AddressEmptyCode> for Error {
    fn from(value: AddressEmptyCode) -> Self {
        Error::EmptyCode(value)
    }
}

impl From<FailedCall> for Error {
    fn from(value: FailedCall) -> Self {
        Error::FailedCall(value)
    }
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::EmptyCode(e) => e.abi_encode(),
            Error::FailedCall(e) => e.abi_encode(),
            Error::Revert(reason) => reason,
        }
    }
}

/// A collection of utilities for working with [`Address`].
pub struct AddressUtils;

impl AddressUtils {
    /// Performs a delegate call to `target` with the given `data`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Frame whose storage the delegated code runs against.
    /// * `target` - The address of the target contract.
    /// * `data` - The data to pass to the target contract.
    ///
    /// # Errors
    ///
    /// * [`Error::FailedCall`] - If the call to the target contract fails
    ///   without a revert reason.
    /// * [`Error::Revert`] - If the call to the target contract fails with a
    ///   revert reason.
    /// * [`Error::EmptyCode`] - If the target contract has no code.
    pub fn function_delegate_call(
        ctx: &mut CallContext<'_>,
        target: Address,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let result = ctx.delegate_call(target, data);
        Self::verify_call_result_from_target(ctx, target, result)
    }

    /// Helper function to verify that a low level call to smart-contract was
    /// successful.
    ///
    /// Reverts if the target was not a contract or if the call fails for any
    /// other reason. Bubbles up the revert reason (falling back to
    /// [`Error::FailedCall`]) in case of an unsuccessful call.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Read access to the running frame.
    /// * `target` - The address of the target contract.
    /// * `result` - The result of the call.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyCode`] - If the target contract has no code.
    /// * [`Error::Revert`] - If the call to the target contract fails with a
    ///   revert reason.
    /// * [`Error::FailedCall`] - If the call to the target contract fails
    ///   without a revert reason.
    pub fn verify_call_result_from_target(
        ctx: &CallContext<'_>,
        target: Address,
        result: ArbResult,
    ) -> Result<Vec<u8>, Error> {
        match result {
            Ok(returndata) => {
                if returndata.is_empty() && !ctx.has_code(target) {
                    return Err(AddressEmptyCode { target }.into());
                }
                Ok(returndata)
            }
            Err(reason) => Err(Self::revert(reason)),
        }
    }

    /// Reverts with `reason` if it is not empty. Otherwise reverts with
    /// [`Error::FailedCall`].
    ///
    /// This behavior is aligned with Solidity implementation of
    /// [Address.sol].
    ///
    /// [Address.sol]: https://github.com/OpenZeppelin/openzeppelin-contracts/blob/master/contracts/utils/Address.sol
    fn revert(reason: Vec<u8>) -> Error {
        if reason.is_empty() {
            FailedCall {}.into()
        } else {
            Error::Revert(reason)
        }
    }
}
