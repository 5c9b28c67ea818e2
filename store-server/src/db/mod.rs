//! Database layer
//!
//! Single embedded redb store. All multi-step mutations share one write
//! transaction, which redb serializes; that serialization is what makes the
//! conditional stock deduct a real compare-and-decrement.

mod storage;

pub use storage::{MovementDraft, StorageError, StorageResult, StoreStorage};
