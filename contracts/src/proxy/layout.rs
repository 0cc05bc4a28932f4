//! Storage layout descriptions and the upgrade compatibility check.
//!
//! A proxy's storage is positional: slot `i` means whatever the current
//! implementation says it means. Swapping in an implementation that reads
//! slot `i` as something else silently reinterprets persisted data. The proxy
//! cannot detect this at runtime, so the check lives here, to be run by
//! whoever prepares an upgrade, before `upgradeTo` is sent.
//!
//! ```rust
//! use upgradeable_proxy::proxy::layout::{SlotType, StorageLayout};
//!
//! let v1 = StorageLayout::new().with("value", SlotType::Uint256);
//! let v2 = v1.clone().with("owner", SlotType::Address);
//!
//! assert!(v1.check_upgrade(&v2).is_ok());
//! assert!(v2.check_upgrade(&v1).is_err());
//! ```
use core::fmt::{self, Display};

use alloy_primitives::U256;
use tracing::debug;

/// The type stored in a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotType {
    /// `uint256`.
    Uint256,
    /// `address`.
    Address,
    /// `bool`.
    Bool,
    /// `bytes32`.
    Bytes32,
}

impl Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotType::Uint256 => "uint256",
            SlotType::Address => "address",
            SlotType::Bool => "bool",
            SlotType::Bytes32 => "bytes32",
        };
        f.write_str(name)
    }
}

/// A named slot declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotDecl {
    /// Name of the variable, informational only.
    pub name: String,
    /// Type of the variable.
    pub slot_type: SlotType,
}

/// Ordered slot declarations of an implementation. The position in the list
/// is the slot index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageLayout {
    slots: Vec<SlotDecl>,
}

impl StorageLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot named `name` of type `slot_type`.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        slot_type: SlotType,
    ) -> Self {
        self.slots.push(SlotDecl { name: name.into(), slot_type });
        self
    }

    /// Gets the declared slots in order.
    #[must_use]
    pub fn slots(&self) -> &[SlotDecl] {
        &self.slots
    }

    /// Gets the number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the slot index of the variable called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<U256> {
        self.slots
            .iter()
            .position(|slot| slot.name == name)
            .map(U256::from)
    }

    /// Checks that `next` can replace `self` behind the same proxy.
    ///
    /// `next` must keep every slot of `self` at the same index with the same
    /// type and may only add slots at the end. Renaming is allowed, since
    /// names do not reach storage.
    ///
    /// # Errors
    ///
    /// * [`LayoutViolation::Removed`] - If `next` is shorter than `self`.
    /// * [`LayoutViolation::Retyped`] - If a slot changed type.
    pub fn check_upgrade(
        &self,
        next: &StorageLayout,
    ) -> Result<(), LayoutViolation> {
        for (index, current) in self.slots.iter().enumerate() {
            let Some(candidate) = next.slots.get(index) else {
                return Err(LayoutViolation::Removed {
                    index,
                    name: current.name.clone(),
                });
            };

            if candidate.slot_type != current.slot_type {
                return Err(LayoutViolation::Retyped {
                    index,
                    name: current.name.clone(),
                    from: current.slot_type,
                    to: candidate.slot_type,
                });
            }

            if candidate.name != current.name {
                debug!(
                    index,
                    from = %current.name,
                    to = %candidate.name,
                    "slot renamed"
                );
            }
        }

        Ok(())
    }
}

/// A layout change that would corrupt persisted state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutViolation {
    /// A slot of the current layout is missing from the new one.
    Removed {
        /// Index of the missing slot.
        index: usize,
        /// Name of the missing slot in the current layout.
        name: String,
    },
    /// A slot keeps its index but changes type.
    Retyped {
        /// Index of the slot.
        index: usize,
        /// Name of the slot in the current layout.
        name: String,
        /// Current type.
        from: SlotType,
        /// Type in the new layout.
        to: SlotType,
    },
}

impl Display for LayoutViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutViolation::Removed { index, name } => {
                write!(f, "slot {index} (`{name}`) was removed")
            }
            LayoutViolation::Retyped { index, name, from, to } => {
                write!(
                    f,
                    "slot {index} (`{name}`) changed type from {from} to {to}"
                )
            }
        }
    }
}

impl std::error::Error for LayoutViolation {}
