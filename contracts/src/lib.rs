/*!
# Upgradeable Proxy

An upgradeable proxy following the ERC-1967 storage layout, running on the
[`slot_vm`] host.

The proxy keeps two reserved slots: the address of the current
implementation and the address of the admin. Calls matching one of the
admin selectors (see [`proxy::abi::IErc1967Proxy`]) are handled by the
proxy itself. Every other call is delegated to the implementation, whose
code then runs against the proxy's storage and sees the proxy's caller as
`msg_sender`.

Only the admin may upgrade. A failed call, including a failed upgrade
setup call, leaves no trace in storage or logs.

## Usage

```rust
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use slot_vm::Vm;
use upgradeable_proxy::{
    logic::counter::{CounterV1, CounterV2, ICounter},
    proxy::erc1967::{proxy::upgradeToCall, Erc1967Proxy},
};

let admin = Address::repeat_byte(0xAD);
let mut vm = Vm::default();

let v1 = vm.sender(admin).deploy(CounterV1, &[]).unwrap();
let v2 = vm.sender(admin).deploy(CounterV2, &[]).unwrap();
let args = Erc1967Proxy::constructor_args(v1, admin, &[]);
let proxy = vm.sender(admin).deploy(Erc1967Proxy, &args).unwrap();

let set = ICounter::setValueCall { value: U256::from(5) }.abi_encode();
vm.sender(admin).call(proxy, &set).unwrap();

let upgrade = upgradeToCall { newImplementation: v2 }.abi_encode();
vm.sender(admin).call(proxy, &upgrade).unwrap();

vm.sender(admin).call(proxy, &set).unwrap();
let read = ICounter::valueCall {}.abi_encode();
let value = vm.sender(admin).view(proxy, &read).unwrap();
assert_eq!(value, U256::from(10).abi_encode());
```
*/

#![allow(clippy::module_name_repetitions)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod access;
pub mod logic;
pub mod proxy;
pub mod utils;
