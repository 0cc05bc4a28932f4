//! Access control for the administrative surface of a proxy.
//!
//! There is exactly one account, the admin, allowed to repoint a proxy. Its
//! address lives in the ERC-1967 admin slot of the proxy, so the check reads
//! the same storage the forwarded logic runs against without ever colliding
//! with it.
use alloy_sol_types::SolError;
pub use sol::*;
use slot_vm::CallContext;

use crate::proxy::erc1967::utils::Erc1967Utils;

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// The caller account is not authorized to perform an operation.
        ///
        /// * `account` - Account that was found to not be authorized.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ProxyUnauthorizedAccount(address account);
    }
}

/// An error that occurred while checking the proxy admin.
#[derive(Debug)]
pub enum Error {
    /// The caller account is not authorized to perform an operation.
    UnauthorizedAccount(ProxyUnauthorizedAccount),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::UnauthorizedAccount(e) => e.abi_encode(),
        }
    }
}

/// Admin checks of an ERC-1967 proxy.
pub struct ProxyAdmin;

impl ProxyAdmin {
    /// Checks if the caller of the running frame is the admin.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Read access to the proxy's state.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If called by any account other than
    ///   the admin.
    pub fn only_admin(ctx: &CallContext<'_>) -> Result<(), Error> {
        let account = ctx.msg_sender();
        if Erc1967Utils::get_admin(ctx) != account {
            return Err(Error::UnauthorizedAccount(ProxyUnauthorizedAccount {
                account,
            }));
        }

        Ok(())
    }
}
