//! The frame handle passed to running code.
use alloy_primitives::{Address, Log, B256, U256};
use alloy_sol_types::SolEvent;

use crate::{vm::Frame, ArbResult, Vm};

/// Access to the state of the frame a contract executes in.
///
/// Storage reads and writes always target [`CallContext::address`], which
/// under a delegate call is the delegating account rather than the account
/// holding the code.
pub struct CallContext<'a> {
    vm: &'a mut Vm,
    frame: Frame,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(vm: &'a mut Vm, frame: Frame) -> Self {
        Self { vm, frame }
    }

    /// Gets the address whose storage this frame reads and writes.
    #[must_use]
    pub fn address(&self) -> Address {
        self.frame.address
    }

    /// Gets the address the executing code was loaded from.
    #[must_use]
    pub fn code_address(&self) -> Address {
        self.frame.code_address
    }

    /// Gets the address of the account that called the program.
    #[must_use]
    pub fn msg_sender(&self) -> Address {
        self.frame.msg_sender
    }

    /// Gets the nesting depth of this frame; top-level calls run at `0`.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frame.depth
    }

    /// Gets the block timestamp.
    #[must_use]
    pub fn block_timestamp(&self) -> u64 {
        self.vm.environment().block_timestamp()
    }

    /// Gets the chain id.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.vm.environment().chain_id()
    }

    /// Reads the word at `key` in this frame's storage.
    #[must_use]
    pub fn sload(&self, key: U256) -> B256 {
        self.vm.storage(self.frame.address, key)
    }

    /// Writes `value` at `key` in this frame's storage.
    pub fn sstore(&mut self, key: U256, value: B256) {
        self.vm.write_storage(self.frame.address, key, value);
    }

    /// Emits `event` as a log of this frame's address.
    pub fn emit<E: SolEvent>(&mut self, event: &E) {
        let log = Log {
            address: self.frame.address,
            data: event.encode_log_data(),
        };
        self.vm.push_log(log);
    }

    /// Returns `true` if `account` has code installed.
    #[must_use]
    pub fn has_code(&self, account: Address) -> bool {
        self.vm.has_code(account)
    }

    /// Calls `target` in its own storage context, with this frame's address
    /// as the sender.
    ///
    /// # Errors
    ///
    /// * Revert data of the callee. Its effects are already rolled back.
    pub fn call(&mut self, target: Address, calldata: &[u8]) -> ArbResult {
        let frame = Frame {
            address: target,
            code_address: target,
            msg_sender: self.frame.address,
            depth: self.frame.depth + 1,
        };
        self.vm.execute(frame, calldata)
    }

    /// Runs the code of `target` against this frame's storage, keeping the
    /// current sender.
    ///
    /// # Errors
    ///
    /// * Revert data of the delegated code. Its effects are already rolled
    ///   back.
    pub fn delegate_call(
        &mut self,
        target: Address,
        calldata: &[u8],
    ) -> ArbResult {
        let frame = Frame {
            address: self.frame.address,
            code_address: target,
            msg_sender: self.frame.msg_sender,
            depth: self.frame.depth + 1,
        };
        self.vm.execute(frame, calldata)
    }
}
