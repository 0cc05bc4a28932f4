//! The code side of an account.
use crate::CallContext;

/// Result of running contract code: return data on success, revert data on
/// failure.
pub type ArbResult = Result<Vec<u8>, Vec<u8>>;

/// Code that can be installed at an address and executed by the [`Vm`].
///
/// Implementations hold no state of their own. Everything they persist goes
/// through [`CallContext::sstore`], which writes to whatever account the
/// current frame executes in. Under a `delegate_call` that is the caller's
/// storage, not the account the code was deployed at.
///
/// [`Vm`]: crate::Vm
pub trait Contract: Send + Sync {
    /// Human readable name used in tracing output.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Runs once, when the code is deployed.
    ///
    /// Returning `Err` aborts the deployment and discards the new account.
    ///
    /// # Arguments
    ///
    /// * `&self` - The code being deployed.
    /// * `ctx` - Frame of the new account.
    /// * `args` - ABI-encoded constructor arguments.
    ///
    /// # Errors
    ///
    /// * Revert data of a failed constructor.
    fn constructor(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> ArbResult {
        let _ = (ctx, args);
        Ok(Vec::new())
    }

    /// Entry point for every call routed to this code.
    ///
    /// # Arguments
    ///
    /// * `&self` - The executing code.
    /// * `ctx` - Frame the code executes in.
    /// * `calldata` - Raw calldata of the call.
    ///
    /// # Errors
    ///
    /// * Revert data, relayed to the caller unchanged.
    fn call(&self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> ArbResult;
}
