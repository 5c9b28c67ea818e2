//! Movement ledger hash chain
//!
//! Every stock movement is sealed with a SHA-256 hash over its fields plus
//! the previous entry's hash, so the ledger is tamper-evident end to end.
//! Verification walks the chain and reports every break: a `Link` break when
//! an entry does not point at its predecessor, a `Content` break when an
//! entry's fields no longer match its own hash.

use crate::db::MovementDraft;
use sha2::{Digest, Sha256};
use shared::models::{
    Actor, ChainBreak, ChainBreakKind, ChainVerification, MovementKind, StockMovement,
};

/// Hash of the empty chain (before the first movement)
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Seal a draft into an immutable ledger entry
pub fn seal(id: u64, timestamp: i64, prev_hash: &str, draft: MovementDraft) -> StockMovement {
    let curr_hash = compute_hash(
        id,
        timestamp,
        prev_hash,
        &draft.product_id,
        &draft.variant_sku,
        draft.kind,
        draft.quantity,
        draft.stock_before,
        draft.stock_after,
        draft.order_id.as_deref(),
        &draft.actor,
        draft.note.as_deref(),
        draft.unit_cost,
    );
    StockMovement {
        id,
        product_id: draft.product_id,
        variant_sku: draft.variant_sku,
        kind: draft.kind,
        quantity: draft.quantity,
        stock_before: draft.stock_before,
        stock_after: draft.stock_after,
        order_id: draft.order_id,
        actor: draft.actor,
        note: draft.note,
        unit_cost: draft.unit_cost,
        timestamp,
        prev_hash: prev_hash.to_string(),
        curr_hash,
    }
}

/// Recompute the hash an entry should carry
pub fn entry_hash(movement: &StockMovement) -> String {
    compute_hash(
        movement.id,
        movement.timestamp,
        &movement.prev_hash,
        &movement.product_id,
        &movement.variant_sku,
        movement.kind,
        movement.quantity,
        movement.stock_before,
        movement.stock_after,
        movement.order_id.as_deref(),
        &movement.actor,
        movement.note.as_deref(),
        movement.unit_cost,
    )
}

#[allow(clippy::too_many_arguments)]
fn compute_hash(
    id: u64,
    timestamp: i64,
    prev_hash: &str,
    product_id: &str,
    variant_sku: &str,
    kind: MovementKind,
    quantity: i64,
    stock_before: i64,
    stock_after: i64,
    order_id: Option<&str>,
    actor: &Actor,
    note: Option<&str>,
    unit_cost: Option<f64>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(id.to_le_bytes());
    hasher.update(timestamp.to_le_bytes());
    hasher.update(product_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(variant_sku.as_bytes());
    hasher.update([0u8]);
    hasher.update(kind.to_string().as_bytes());
    hasher.update(quantity.to_le_bytes());
    hasher.update(stock_before.to_le_bytes());
    hasher.update(stock_after.to_le_bytes());
    if let Some(oid) = order_id {
        hasher.update(oid.as_bytes());
    }
    hasher.update([0u8]);
    hasher.update(actor.label().as_bytes());
    if let Some(n) = note {
        hasher.update(n.as_bytes());
    }
    if let Some(cost) = unit_cost {
        hasher.update(cost.to_be_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Verify a full ledger scan (in append order)
pub fn verify(movements: &[StockMovement]) -> ChainVerification {
    let mut breaks = Vec::new();
    let mut expected_prev = GENESIS_HASH.to_string();

    for movement in movements {
        if movement.prev_hash != expected_prev {
            breaks.push(ChainBreak {
                movement_id: movement.id,
                kind: ChainBreakKind::Link,
                expected_hash: expected_prev.clone(),
                actual_hash: movement.prev_hash.clone(),
            });
        }
        let recomputed = entry_hash(movement);
        if movement.curr_hash != recomputed {
            breaks.push(ChainBreak {
                movement_id: movement.id,
                kind: ChainBreakKind::Content,
                expected_hash: recomputed,
                actual_hash: movement.curr_hash.clone(),
            });
        }
        expected_prev = movement.curr_hash.clone();
    }

    ChainVerification {
        total_entries: movements.len() as u64,
        chain_intact: breaks.is_empty(),
        breaks,
    }
}
