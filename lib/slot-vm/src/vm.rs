//! Account state, call execution and rollback.
use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{keccak256, Address, Log, B256, U256};
use alloy_sol_types::{SolError, SolEvent};
pub use sol::*;
use tracing::{debug, debug_span, trace, warn};

use crate::{
    journal::{Checkpoint, Journal, JournalEntry},
    ArbResult, CallContext, Contract, Environment,
};

mod sol {
    #![allow(missing_docs)]

    use alloy_sol_macro::sol;

    sol! {
        /// A call frame was opened deeper than the environment allows.
        ///
        /// * `depth` - Depth of the rejected frame.
        #[derive(Debug)]
        error VmCallDepthExceeded(uint256 depth);
    }
}

/// A single call frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    /// Account whose storage is read and written.
    pub(crate) address: Address,
    /// Account whose code runs.
    pub(crate) code_address: Address,
    pub(crate) msg_sender: Address,
    pub(crate) depth: usize,
}

/// In-memory world state plus the machinery to run calls against it.
///
/// Every public entry point is one unit of work: it either applies fully
/// or, on `Err`, leaves the state exactly as it found it.
#[derive(Default)]
pub struct Vm {
    environment: Environment,
    code: HashMap<Address, Arc<dyn Contract>>,
    storage: HashMap<Address, HashMap<U256, B256>>,
    nonces: HashMap<Address, u64>,
    logs: Vec<Log>,
    journal: Journal,
    /// Checkpoints held open around top-level work, e.g. by [`Vm::view`].
    pinned: usize,
}

impl Vm {
    /// Creates an empty vm running in `environment`.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self { environment, ..Self::default() }
    }

    /// Gets the environment of this vm.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Returns a handle that sends calls as `address`.
    pub fn sender(&mut self, address: Address) -> Sender<'_> {
        Sender { vm: self, address }
    }

    /// Installs `code` at a fresh address and runs its constructor with
    /// `args`, sent by `deployer`.
    ///
    /// The address is derived from `deployer` and its deployment nonce. The
    /// nonce is consumed even if the constructor fails.
    ///
    /// # Errors
    ///
    /// * Revert data of the constructor. Nothing of the deployment is kept.
    pub fn deploy<C: Contract + 'static>(
        &mut self,
        deployer: Address,
        code: C,
        args: &[u8],
    ) -> Result<Address, Vec<u8>> {
        let address = self.next_address(deployer);
        let code: Arc<dyn Contract> = Arc::new(code);
        let span = debug_span!("deploy", contract = code.name(), %address);
        let _enter = span.enter();

        let checkpoint = self.checkpoint();
        self.code.insert(address, Arc::clone(&code));
        self.journal.push(JournalEntry::AccountCreated { address });

        let frame = Frame {
            address,
            code_address: address,
            msg_sender: deployer,
            depth: 0,
        };
        match code.constructor(&mut CallContext::new(self, frame), args) {
            Ok(_) => {
                debug!("deployed");
                self.commit();
                Ok(address)
            }
            Err(revert) => {
                debug!(
                    revert = %alloy_primitives::hex::encode(&revert),
                    "constructor reverted"
                );
                self.revert_to(checkpoint);
                Err(revert)
            }
        }
    }

    /// Sends `calldata` from `sender` to `to` as one unit of work.
    ///
    /// # Errors
    ///
    /// * Revert data of the call. All of its effects are discarded.
    pub fn transact(
        &mut self,
        sender: Address,
        to: Address,
        calldata: &[u8],
    ) -> ArbResult {
        let frame = Frame {
            address: to,
            code_address: to,
            msg_sender: sender,
            depth: 0,
        };
        let result = self.execute(frame, calldata);
        if result.is_ok() {
            self.commit();
        }
        result
    }

    /// Runs `calldata` from `sender` against `to` and discards every effect,
    /// successful or not.
    ///
    /// # Errors
    ///
    /// * Revert data of the call.
    pub fn view(
        &mut self,
        sender: Address,
        to: Address,
        calldata: &[u8],
    ) -> ArbResult {
        let checkpoint = self.checkpoint();
        self.pinned += 1;
        let result = self.transact(sender, to, calldata);
        self.pinned -= 1;
        self.revert_to(checkpoint);
        result
    }

    /// Reads slot `key` of `address` directly, outside of any call.
    #[must_use]
    pub fn storage(&self, address: Address, key: U256) -> B256 {
        self.storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or_default()
    }

    /// Returns `true` if `address` has code installed.
    #[must_use]
    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    /// Gets all logs emitted by committed work, oldest first.
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Returns `true` if `address` emitted `event`.
    #[must_use]
    pub fn emitted<E: SolEvent>(&self, address: Address, event: &E) -> bool {
        let data = event.encode_log_data();
        self.logs.iter().any(|log| log.address == address && log.data == data)
    }

    /// Removes all logs.
    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub(crate) fn execute(
        &mut self,
        frame: Frame,
        calldata: &[u8],
    ) -> ArbResult {
        if frame.depth > self.environment.max_call_depth() {
            warn!(depth = frame.depth, "call depth exceeded");
            return Err(VmCallDepthExceeded { depth: U256::from(frame.depth) }
                .abi_encode());
        }

        let Some(code) = self.code.get(&frame.code_address).cloned() else {
            trace!(
                target = %frame.code_address,
                "call to account without code"
            );
            return Ok(Vec::new());
        };

        let span = debug_span!(
            "frame",
            contract = code.name(),
            address = %frame.address,
            sender = %frame.msg_sender,
            depth = frame.depth,
        );
        let _enter = span.enter();

        let checkpoint = self.checkpoint();
        let result = code.call(&mut CallContext::new(self, frame), calldata);
        if let Err(revert) = &result {
            debug!(
                revert = %alloy_primitives::hex::encode(revert),
                "frame reverted"
            );
            self.revert_to(checkpoint);
        }
        result
    }

    pub(crate) fn write_storage(
        &mut self,
        address: Address,
        key: U256,
        value: B256,
    ) {
        let previous =
            self.storage.entry(address).or_default().insert(key, value);
        trace!(%address, %key, %value, "sstore");
        self.journal.push(JournalEntry::StorageChanged {
            address,
            key,
            previous,
        });
    }

    pub(crate) fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Drops the undo log of finished top-level work unless an outer
    /// checkpoint still needs it.
    fn commit(&mut self) {
        if self.pinned == 0 {
            self.journal.clear();
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            journal_len: self.journal.len(),
            logs_len: self.logs.len(),
        }
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        for entry in self.journal.unwind(checkpoint.journal_len) {
            match entry {
                JournalEntry::StorageChanged { address, key, previous } => {
                    let slots = self.storage.entry(address).or_default();
                    match previous {
                        Some(word) => slots.insert(key, word),
                        None => slots.remove(&key),
                    };
                }
                JournalEntry::AccountCreated { address } => {
                    self.code.remove(&address);
                }
            }
        }
        self.logs.truncate(checkpoint.logs_len);
    }

    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.nonces.entry(deployer).or_default();
        let preimage =
            [deployer.as_slice(), nonce.to_be_bytes().as_slice()].concat();
        *nonce += 1;
        Address::from_word(keccak256(preimage))
    }
}

/// Sends calls and deployments on behalf of a fixed account.
pub struct Sender<'a> {
    vm: &'a mut Vm,
    address: Address,
}

impl Sender<'_> {
    /// See [`Vm::transact`].
    ///
    /// # Errors
    ///
    /// * Revert data of the call.
    pub fn call(self, to: Address, calldata: &[u8]) -> ArbResult {
        self.vm.transact(self.address, to, calldata)
    }

    /// See [`Vm::view`].
    ///
    /// # Errors
    ///
    /// * Revert data of the call.
    pub fn view(self, to: Address, calldata: &[u8]) -> ArbResult {
        self.vm.view(self.address, to, calldata)
    }

    /// See [`Vm::deploy`].
    ///
    /// # Errors
    ///
    /// * Revert data of the constructor.
    pub fn deploy<C: Contract + 'static>(
        self,
        code: C,
        args: &[u8],
    ) -> Result<Address, Vec<u8>> {
        self.vm.deploy(self.address, code, args)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256, U256};
    use alloy_sol_macro::sol;
    use alloy_sol_types::{SolCall, SolError, SolValue};

    use super::*;
    use crate::storage::{StorageType, StorageU256};

    sol! {
        function ping(address to, uint256 value) external returns (uint256);
        function pong(uint256 value) external returns (uint256);
        function count() external view returns (uint256);
        event Pinged(uint256 value);
        error Refused(uint256 value);
    }

    const COUNT: U256 = U256::ZERO;

    struct PingContract;

    impl Contract for PingContract {
        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            if let Ok(call) = pingCall::abi_decode(calldata) {
                let pong = pongCall { value: call.value }.abi_encode();
                let ret = ctx.call(call.to, &pong)?;
                let counter = StorageU256::new(COUNT);
                let pings = counter.get(ctx);
                counter.set(ctx, pings + U256::from(1));
                ctx.emit(&Pinged { value: call.value });
                return Ok(ret);
            }
            let counter = StorageU256::new(COUNT);
            Ok(counter.get(ctx).abi_encode())
        }
    }

    struct PongContract;

    impl Contract for PongContract {
        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            if let Ok(call) = pongCall::abi_decode(calldata) {
                let counter = StorageU256::new(COUNT);
                let pongs = counter.get(ctx);
                counter.set(ctx, pongs + U256::from(1));
                if call.value.is_zero() {
                    return Err(Refused { value: call.value }.abi_encode());
                }
                return Ok((call.value + U256::from(1)).abi_encode());
            }
            let counter = StorageU256::new(COUNT);
            Ok(counter.get(ctx).abi_encode())
        }
    }

    /// Writes slot zero, then fails when asked to.
    struct Writer;

    impl Contract for Writer {
        fn constructor(
            &self,
            ctx: &mut CallContext<'_>,
            args: &[u8],
        ) -> ArbResult {
            ctx.sstore(U256::ZERO, B256::with_last_byte(1));
            if args.first() == Some(&0xff) {
                return Err(b"constructor refused".to_vec());
            }
            Ok(Vec::new())
        }

        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            ctx.sstore(U256::ZERO, B256::with_last_byte(calldata[0]));
            ctx.sstore(U256::from(1), ctx.msg_sender().into_word());
            if calldata[0] == 0 {
                return Err(b"zero".to_vec());
            }
            Ok(Vec::new())
        }
    }

    /// Delegates everything to the address stored in slot `0xff`.
    struct Delegator;

    impl Contract for Delegator {
        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            if calldata.len() == 20 {
                let target = Address::from_slice(calldata);
                ctx.sstore(U256::from(0xff), target.into_word());
                return Ok(Vec::new());
            }
            let target = Address::from_word(ctx.sload(U256::from(0xff)));
            ctx.delegate_call(target, calldata)
        }
    }

    /// Answers with the chain id and block timestamp it observes.
    struct Clock;

    impl Contract for Clock {
        fn call(&self, ctx: &mut CallContext<'_>, _: &[u8]) -> ArbResult {
            Ok((U256::from(ctx.chain_id()), U256::from(ctx.block_timestamp()))
                .abi_encode_params())
        }
    }

    /// Calls itself forever.
    struct Recursive;

    impl Contract for Recursive {
        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            calldata: &[u8],
        ) -> ArbResult {
            let this = ctx.address();
            ctx.call(this, calldata)
        }
    }

    fn alice() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xB0)
    }

    #[test]
    fn ping_pong_works() {
        let mut vm = Vm::default();
        let ping = vm.sender(alice()).deploy(PingContract, &[]).unwrap();
        let pong = vm.sender(alice()).deploy(PongContract, &[]).unwrap();

        let value = U256::from(10);
        let ret = vm
            .sender(alice())
            .call(ping, &pingCall { to: pong, value }.abi_encode())
            .expect("should ping successfully");

        assert_eq!(ret, (value + U256::from(1)).abi_encode());
        let count = countCall {}.abi_encode();
        let one = U256::from(1).abi_encode();
        assert_eq!(vm.sender(alice()).view(ping, &count).unwrap(), one);
        assert_eq!(vm.sender(alice()).view(pong, &count).unwrap(), one);
        assert!(vm.emitted(ping, &Pinged { value }));
    }

    #[test]
    fn failed_subcall_reverts_whole_unit_of_work() {
        let mut vm = Vm::default();
        let ping = vm.sender(alice()).deploy(PingContract, &[]).unwrap();
        let pong = vm.sender(alice()).deploy(PongContract, &[]).unwrap();

        let err = vm
            .sender(alice())
            .call(ping, &pingCall { to: pong, value: U256::ZERO }.abi_encode())
            .expect_err("pong should refuse zero");

        assert_eq!(err, Refused { value: U256::ZERO }.abi_encode());
        assert_eq!(vm.storage(pong, COUNT), B256::ZERO);
        assert_eq!(vm.storage(ping, COUNT), B256::ZERO);
        assert!(vm.logs().is_empty());
    }

    #[test]
    fn delegate_call_uses_caller_storage_and_sender() {
        let mut vm = Vm::default();
        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        let delegator = vm.sender(alice()).deploy(Delegator, &[]).unwrap();
        vm.sender(alice()).call(delegator, writer.as_slice()).unwrap();

        vm.sender(bob()).call(delegator, &[7]).expect("should write");

        assert_eq!(vm.storage(delegator, U256::ZERO), B256::with_last_byte(7));
        assert_eq!(vm.storage(delegator, U256::from(1)), bob().into_word());
        // The writer's own storage only holds what its constructor wrote.
        assert_eq!(vm.storage(writer, U256::ZERO), B256::with_last_byte(1));
        assert_eq!(vm.storage(writer, U256::from(1)), B256::ZERO);
    }

    #[test]
    fn reverted_delegate_call_leaves_no_partial_writes() {
        let mut vm = Vm::default();
        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        let delegator = vm.sender(alice()).deploy(Delegator, &[]).unwrap();
        vm.sender(alice()).call(delegator, writer.as_slice()).unwrap();
        vm.sender(alice()).call(delegator, &[3]).unwrap();

        let err =
            vm.sender(bob()).call(delegator, &[0]).expect_err("should revert");

        assert_eq!(err, b"zero".to_vec());
        assert_eq!(vm.storage(delegator, U256::ZERO), B256::with_last_byte(3));
        assert_eq!(vm.storage(delegator, U256::from(1)), alice().into_word());
    }

    #[test]
    fn view_discards_writes() {
        let mut vm = Vm::default();
        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();

        vm.sender(alice()).view(writer, &[9]).expect("should run");

        assert_eq!(vm.storage(writer, U256::ZERO), B256::with_last_byte(1));
    }

    #[test]
    fn failed_constructor_discards_account() {
        let mut vm = Vm::default();
        let err = vm.sender(alice()).deploy(Writer, &[0xff]).unwrap_err();
        assert_eq!(err, b"constructor refused".to_vec());

        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        assert!(vm.has_code(writer));
        assert_eq!(vm.code.len(), 1);
    }

    #[test]
    fn deploy_addresses_are_unique_per_nonce() {
        let mut vm = Vm::default();
        let first = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        let second = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        let third = vm.sender(bob()).deploy(Writer, &[]).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, third);
        assert_ne!(second, third);
    }

    #[test]
    fn call_to_account_without_code_succeeds_empty() {
        let mut vm = Vm::default();
        let ret = vm.sender(alice()).call(bob(), &[1, 2, 3]).unwrap();
        assert!(ret.is_empty());
    }

    #[test]
    fn committed_work_does_not_grow_journal() {
        let mut vm = Vm::default();
        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        let before = vm.journal.len();

        for byte in 1..=100u8 {
            vm.sender(alice()).call(writer, &[byte]).unwrap();
        }

        assert_eq!(vm.journal.len(), before);
        assert_eq!(vm.storage(writer, U256::ZERO), B256::with_last_byte(100));
    }

    #[test]
    fn view_still_discards_after_commit() {
        let mut vm = Vm::default();
        let writer = vm.sender(alice()).deploy(Writer, &[]).unwrap();
        vm.sender(alice()).call(writer, &[5]).unwrap();

        vm.sender(bob()).view(writer, &[6]).unwrap();

        assert_eq!(vm.storage(writer, U256::ZERO), B256::with_last_byte(5));
        assert_eq!(vm.storage(writer, U256::from(1)), alice().into_word());
        assert_eq!(vm.journal.len(), 0);
    }

    #[test]
    fn running_code_sees_environment() {
        let environment =
            Environment::default().with_chain_id(1).with_block_timestamp(99);
        let mut vm = Vm::new(environment);
        let clock = vm.sender(alice()).deploy(Clock, &[]).unwrap();

        let ret = vm.sender(alice()).view(clock, &[]).unwrap();

        assert_eq!(ret, (U256::from(1), U256::from(99)).abi_encode_params());
    }

    #[test]
    fn call_depth_is_bounded() {
        let mut vm = Vm::new(Environment::default().with_max_call_depth(16));
        let recursive = vm.sender(alice()).deploy(Recursive, &[]).unwrap();

        let err = vm.sender(alice()).call(recursive, &[]).unwrap_err();

        let decoded = VmCallDepthExceeded::abi_decode(&err).unwrap();
        assert_eq!(decoded.depth, U256::from(17));
    }
}
