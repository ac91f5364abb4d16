//! Cabinet inventory: physical medication packages and their dose balances.
//!
//! Entries are consumed in FIFO-by-expiry order. Inventory is an aggregate of
//! its own: it never talks to schedules or completion records directly and is
//! kept consistent with them only through the reconciler's event handling.

pub mod entry;
pub mod inventory;

pub use entry::{CabinetEntry, CabinetEntryId, NewCabinetEntry};
pub use inventory::{CabinetEntryUpdate, CabinetInventory, WORKING_SET_LIMIT};
