//! Secondary-index selection for queries.
//!
//! Selection is advisory: when nothing scores, the caller decides whether a
//! scan is acceptable. The selector never falls back on its own.

mod analyze;
mod selector;


pub use analyze::{RequiredKeys, SortKeyCondition, SortKeyOp, analyze_conditions};
pub use selector::{
    FULL_PROJECTION_BONUS, GLOBAL_BONUS, MIN_USABLE_SCORE, PARTITION_MATCH, SORT_EQUALITY,
    SORT_PREFIX, SORT_RANGE, score, select_optimal,
};
