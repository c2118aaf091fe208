//! Rank generation
//!
//! - [`RankKey`] - base-62 fractional keys with dense insertion
//! - [`RankAllocator`] - neighbour resolution, end/between policies, rebalance

mod allocator;
mod key;

pub use allocator::{Allocation, RankAllocator, next_rank, rank_for_end, rebalance};
pub use key::{BASE, DEFAULT_MAX_RANK_LEN, DIGITS, MID_KEY, RankKey, digit_value};
