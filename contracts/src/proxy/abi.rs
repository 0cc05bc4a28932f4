//! Solidity interface of the administrative surface of
//! [`Erc1967Proxy`].
//!
//! Calls whose selector matches one of these functions are handled by the
//! proxy itself. Every other selector is forwarded to the implementation.
//!
//! [`Erc1967Proxy`]: crate::proxy::erc1967::Erc1967Proxy
#![allow(missing_docs)]

pub use admin::*;

mod admin {
    #![allow(missing_docs)]

    use alloy_sol_macro::sol;

    sol! {
        /// Administrative functions of an ERC-1967 proxy.
        interface IErc1967Proxy {
            function upgradeTo(address newImplementation) external;
            function upgradeToAndCall(address newImplementation, bytes data)
                external;
            function changeAdmin(address newAdmin) external;
            function implementation() external view returns (address);
            function admin() external view returns (address);
        }
    }
}
