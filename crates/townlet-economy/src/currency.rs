//! Coin denominations and inventory money arithmetic.
//!
//! Coins are regular inventory items; only the four denomination ids
//! below carry monetary value. All arithmetic is saturating in `u64`,
//! so no payout or valuation can overflow or panic.

use std::collections::BTreeMap;

use townlet_types::ItemId;

/// The coin denominations, largest first. `(item id, unit value)`.
pub const DENOMINATIONS: [(&str, u64); 4] = [
    ("item:platinum_coin", 1000),
    ("item:gold_coin", 100),
    ("item:silver_coin", 10),
    ("item:bronze_coin", 1),
];

/// Total monetary value of the coin items in an inventory.
///
/// Non-coin items contribute nothing.
pub fn total_value(inventory: &BTreeMap<ItemId, u32>) -> u64 {
    DENOMINATIONS.iter().fold(0_u64, |total, (coin_id, value)| {
        let count = inventory
            .get(&ItemId::from(*coin_id))
            .copied()
            .unwrap_or(0);
        total.saturating_add(u64::from(count).saturating_mul(*value))
    })
}

/// Split an amount into coins, largest denomination first.
///
/// This is the canonical payout decomposition: every path that pays an
/// NPC uses it, so two NPCs earning the same amount always hold the
/// same coins. Denominations with a zero count are omitted.
pub fn split_amount(amount: u64) -> BTreeMap<ItemId, u32> {
    let mut result = BTreeMap::new();
    let mut remaining = amount;
    for (coin_id, value) in DENOMINATIONS {
        if remaining == 0 {
            break;
        }
        let count = remaining.checked_div(value).unwrap_or(0);
        if count > 0 {
            let count = u32::try_from(count).unwrap_or(u32::MAX);
            result.insert(ItemId::from(coin_id), count);
            remaining = remaining.saturating_sub(u64::from(count).saturating_mul(value));
        }
    }
    result
}

/// Merge a coin payout into an inventory additively.
pub fn merge_coins(inventory: &mut BTreeMap<ItemId, u32>, payout: &BTreeMap<ItemId, u32>) {
    for (coin_id, count) in payout {
        let slot = inventory.entry(coin_id.clone()).or_insert(0);
        *slot = slot.saturating_add(*count);
    }
}

/// Deduct a cost from an inventory, spending low-value coins first.
///
/// Coins larger than the remaining cost are never broken for change, so
/// the deduction can fail even when [`total_value`] covers the cost.
/// On failure the returned inventory is the input unchanged; callers
/// never observe a partial deduction.
pub fn deduct_low_first(
    inventory: &BTreeMap<ItemId, u32>,
    cost: u64,
) -> (BTreeMap<ItemId, u32>, bool) {
    let mut deducted = inventory.clone();
    let mut remaining = cost;
    for (coin_id, value) in DENOMINATIONS.iter().rev() {
        let coin_id = ItemId::from(*coin_id);
        let Some(count) = deducted.get(&coin_id).copied() else {
            continue;
        };
        let needed = remaining.checked_div(*value).unwrap_or(0);
        if needed == 0 || count == 0 {
            continue;
        }
        let spend = u32::try_from(needed.min(u64::from(count))).unwrap_or(count);
        remaining = remaining.saturating_sub(u64::from(spend).saturating_mul(*value));
        let left = count.saturating_sub(spend);
        if left == 0 {
            deducted.remove(&coin_id);
        } else {
            deducted.insert(coin_id, left);
        }
    }
    if remaining == 0 {
        (deducted, true)
    } else {
        (inventory.clone(), false)
    }
}
