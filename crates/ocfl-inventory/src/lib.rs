//! The OCFL inventory data model.
//!
//! An [`Inventory`] is the JSON descriptor recording an object's identity,
//! digest algorithm, content manifest, and every version's state. This crate
//! provides the typed, invariant-preserving view over that structure: all
//! mutation goes through methods that keep the manifest, the version states,
//! and `head` consistent with each other.
//!
//! Validators treat inventories as read-only snapshots; the version builder
//! in `ocfl-build` is the single writer.

pub mod error;
pub mod inventory;
pub mod sidecar;
pub mod version;

pub use error::{InventoryError, InventoryResult};
pub use inventory::{AddOutcome, Inventory, DEFAULT_CONTENT_DIRECTORY};
pub use version::{User, Version};
