//! Module with a contract that implement an upgradeable proxy.
//!
//! It is upgradeable because calls are delegated to an implementation address
//! that can be changed. This address is stored in storage in the location
//! specified by [ERC-1967], so that it doesn't conflict with the storage layout
//! of the implementation behind the proxy.
//!
//! [ERC-1967]: https://eips.ethereum.org/EIPS/eip-1967
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolError, SolInterface, SolValue};
pub use sol::*;
use slot_vm::{ArbResult, CallContext, Contract};
use tracing::trace;

use crate::{
    access::admin::{self, ProxyAdmin},
    proxy::{
        abi::IErc1967Proxy::{self, IErc1967ProxyCalls},
        erc1967::utils::{
            self, ERC1967InvalidAdmin, ERC1967InvalidImplementation,
            Erc1967Utils,
        },
        IProxy,
    },
    utils::address,
};

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Calldata carried an administrative selector but its arguments
        /// could not be decoded.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ProxyInvalidCalldata();
    }
}

/// An [`Erc1967Proxy`] error.
#[derive(Debug)]
pub enum Error {
    /// The caller account is not authorized to perform an operation.
    UnauthorizedAccount(admin::ProxyUnauthorizedAccount),
    /// Calldata carried an administrative selector with malformed arguments.
    InvalidCalldata(ProxyInvalidCalldata),
    /// Indicates an error related to the fact that the `implementation`
    /// of the proxy is invalid.
    InvalidImplementation(ERC1967InvalidImplementation),
    /// Indicates an error related to the fact that the `admin` of the
    /// proxy is invalid.
    InvalidAdmin(ERC1967InvalidAdmin),
    /// There's no code at `target` (it is not a contract).
    EmptyCode(address::AddressEmptyCode),
    /// A call to an address target failed. The target may have reverted
    /// without a revert reason.
    FailedCall(address::FailedCall),
    /// A setup call reverted with a reason, bubbled up unchanged.
    Revert(Vec<u8>),
}

impl From<utils::Error> for Error {
    fn from(e: utils::Error) -> Self {
        match e {
            utils::Error::InvalidImplementation(e) => {
                Error::InvalidImplementation(e)
            }
            utils::Error::InvalidAdmin(e) => Error::InvalidAdmin(e),
            utils::Error::EmptyCode(e) => Error::EmptyCode(e),
            utils::Error::FailedCall(e) => Error::FailedCall(e),
            utils::Error::Revert(reason) => Error::Revert(reason),
        }
    }
}

impl From<admin::Error> for Error {
    fn from(e: admin::Error) -> Self {
        match e {
            admin::Error::UnauthorizedAccount(e) => {
                Error::UnauthorizedAccount(e)
            }
        }
    }
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::UnauthorizedAccount(e) => e.abi_encode(),
            Error::InvalidCalldata(e) => e.abi_encode(),
            Error::InvalidImplementation(e) => e.abi_encode(),
            Error::InvalidAdmin(e) => e.abi_encode(),
            Error::EmptyCode(e) => e.abi_encode(),
            Error::FailedCall(e) => e.abi_encode(),
            Error::Revert(reason) => reason,
        }
    }
}

/// An upgradeable proxy with a single admin.
///
/// The proxy owns no storage layout of its own beyond the two ERC-1967
/// slots. Administrative selectors (see [`IErc1967Proxy`]) are served
/// directly; everything else is delegated to the current implementation,
/// resolved from storage on every call.
///
/// Constructor arguments are `(address implementation, address admin, bytes
/// data)`, encoded with [`Erc1967Proxy::constructor_args`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc1967Proxy;

impl Erc1967Proxy {
    /// Encodes the constructor arguments of the proxy.
    ///
    /// # Arguments
    ///
    /// * `implementation` - The first implementation to delegate to.
    /// * `admin` - The account allowed to upgrade the proxy.
    /// * `data` - Initializer calldata delegated to `implementation` during
    ///   construction. Skipped if empty.
    #[must_use]
    pub fn constructor_args(
        implementation: Address,
        admin: Address,
        data: &[u8],
    ) -> Vec<u8> {
        (implementation, admin, Bytes::copy_from_slice(data))
            .abi_encode_params()
    }

    /// Upgrades the proxy to `new_implementation`.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Write access to the proxy's state.
    /// * `new_implementation` - The new implementation address.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If not called by the admin.
    /// * [`Error::InvalidImplementation`] - If `new_implementation` has no
    ///   code.
    ///
    /// # Events
    ///
    /// * [`crate::proxy::erc1967::Upgraded`].
    pub fn upgrade_to(
        &self,
        ctx: &mut CallContext<'_>,
        new_implementation: Address,
    ) -> Result<(), Error> {
        self.upgrade_to_and_call(ctx, new_implementation, &[])
    }

    /// Upgrades the proxy to `new_implementation` and runs `data` through
    /// it in the same unit of work.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Write access to the proxy's state.
    /// * `new_implementation` - The new implementation address.
    /// * `data` - Setup calldata. Skipped if empty.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If not called by the admin.
    /// * [`Error::InvalidImplementation`] - If `new_implementation` has no
    ///   code.
    /// * [`Error::Revert`] - If the setup call reverts. The upgrade is
    ///   undone with it.
    ///
    /// # Events
    ///
    /// * [`crate::proxy::erc1967::Upgraded`].
    pub fn upgrade_to_and_call(
        &self,
        ctx: &mut CallContext<'_>,
        new_implementation: Address,
        data: &[u8],
    ) -> Result<(), Error> {
        ProxyAdmin::only_admin(ctx)?;
        Erc1967Utils::upgrade_to_and_call(ctx, new_implementation, data)?;
        Ok(())
    }

    /// Hands the admin role to `new_admin`.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Write access to the proxy's state.
    /// * `new_admin` - The next admin.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If not called by the admin.
    /// * [`Error::InvalidAdmin`] - If `new_admin` is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`crate::proxy::erc1967::AdminChanged`].
    pub fn change_admin(
        &self,
        ctx: &mut CallContext<'_>,
        new_admin: Address,
    ) -> Result<(), Error> {
        ProxyAdmin::only_admin(ctx)?;
        Erc1967Utils::change_admin(ctx, new_admin)?;
        Ok(())
    }

    /// Returns the admin of the proxy.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Read access to the proxy's state.
    #[must_use]
    pub fn admin(&self, ctx: &CallContext<'_>) -> Address {
        Erc1967Utils::get_admin(ctx)
    }

    /// Routes an administrative call.
    fn dispatch(
        &self,
        ctx: &mut CallContext<'_>,
        calldata: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let call = IErc1967ProxyCalls::abi_decode(calldata)
            .map_err(|_| Error::InvalidCalldata(ProxyInvalidCalldata {}))?;

        match call {
            IErc1967ProxyCalls::upgradeTo(call) => {
                self.upgrade_to(ctx, call.newImplementation)?;
                Ok(Vec::new())
            }
            IErc1967ProxyCalls::upgradeToAndCall(call) => {
                self.upgrade_to_and_call(
                    ctx,
                    call.newImplementation,
                    &call.data,
                )?;
                Ok(Vec::new())
            }
            IErc1967ProxyCalls::changeAdmin(call) => {
                self.change_admin(ctx, call.newAdmin)?;
                Ok(Vec::new())
            }
            IErc1967ProxyCalls::implementation(_) => {
                Ok(Erc1967Utils::get_implementation(ctx).abi_encode())
            }
            IErc1967ProxyCalls::admin(_) => Ok(self.admin(ctx).abi_encode()),
        }
    }

    /// Returns `true` if `calldata` starts with an administrative selector.
    fn is_admin_call(calldata: &[u8]) -> bool {
        calldata
            .get(..4)
            .and_then(|selector| <[u8; 4]>::try_from(selector).ok())
            .is_some_and(IErc1967ProxyCalls::valid_selector)
    }
}

impl IProxy for Erc1967Proxy {
    fn implementation(
        &self,
        ctx: &CallContext<'_>,
    ) -> Result<Address, Vec<u8>> {
        Ok(Erc1967Utils::get_implementation(ctx))
    }
}

impl Contract for Erc1967Proxy {
    fn name(&self) -> &'static str {
        "Erc1967Proxy"
    }

    fn constructor(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> ArbResult {
        let (implementation, admin, data) =
            <(Address, Address, Bytes)>::abi_decode_params(args)
                .map_err(|_| ProxyInvalidCalldata {}.abi_encode())?;

        Erc1967Utils::change_admin(ctx, admin).map_err(Error::from)?;
        Erc1967Utils::upgrade_to_and_call(ctx, implementation, &data)
            .map_err(Error::from)?;

        Ok(Vec::new())
    }

    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> ArbResult {
        if Self::is_admin_call(calldata) {
            trace!(
                proxy = %ctx.address(),
                sender = %ctx.msg_sender(),
                "admin call"
            );
            return Ok(self.dispatch(ctx, calldata)?);
        }

        self.do_fallback(ctx, calldata)
    }
}

/// Re-exported so callers can build administrative calldata without naming
/// the ABI module.
pub use IErc1967Proxy::{
    adminCall, changeAdminCall, implementationCall, upgradeToAndCallCall,
    upgradeToCall,
};
