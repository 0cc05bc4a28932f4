//! Proxy Storage Slots and the events as defined in
//! the [ERC-1967].
//!
//! [ERC-1967]: <https://eips.ethereum.org/EIPS/eip-1967>
pub mod proxy;
pub mod utils;

pub use proxy::Erc1967Proxy;
pub use sol::*;

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when the implementation is upgraded.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Upgraded(address indexed implementation);

        /// Emitted when the admin account has changed.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event AdminChanged(
            address indexed previous_admin,
            address indexed new_admin
        );
    }
}
