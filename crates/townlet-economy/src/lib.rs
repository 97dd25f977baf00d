//! Currency and effect arithmetic.
//!
//! Pure functions over the types in `townlet-types`. Coins are ordinary
//! inventory items with fixed denominations; attribute effects clamp to
//! the `[0, 100]` stat range. No I/O happens here, which keeps every
//! money-handling path unit-testable without a store.
//!
//! # Modules
//!
//! - [`currency`] -- denominations, valuation, payout, deduction
//! - [`effects`] -- applying catalog effects to NPC attributes

pub mod currency;
pub mod effects;

pub use currency::{DENOMINATIONS, deduct_low_first, merge_coins, split_amount, total_value};
pub use effects::apply_effect;
