use crate::{
    index::{RequiredKeys, SortKeyOp},
    model::{IndexKind, IndexSpec, Projection},
};

///
/// SCORES
///

/// Partition key matches the required equality.
pub const PARTITION_MATCH: u32 = 100;

pub const SORT_EQUALITY: u32 = 50;
pub const SORT_PREFIX: u32 = 40;
pub const SORT_RANGE: u32 = 30;

/// Global indexes isolate load from the base table.
pub const GLOBAL_BONUS: u32 = 10;

/// Every attribute is projected; no follow-up read needed.
pub const FULL_PROJECTION_BONUS: u32 = 5;

/// Lowest score a candidate must reach to be selected. Any candidate whose
/// partition key matches clears it; nothing else can.
pub const MIN_USABLE_SCORE: u32 = PARTITION_MATCH;

/// Score one candidate. Zero means unusable.
#[must_use]
pub fn score(index: &IndexSpec, required: &RequiredKeys) -> u32 {
    let Some(pk) = required.partition_key.as_deref() else {
        return 0;
    };
    if index.partition_key_name() != pk {
        return 0;
    }

    let mut score = PARTITION_MATCH;

    if let Some(sk) = &required.sort_key
        && index.sort_key_name() == Some(sk.attribute.as_str())
    {
        score += match sk.op {
            SortKeyOp::Equality => SORT_EQUALITY,
            SortKeyOp::Prefix => SORT_PREFIX,
            SortKeyOp::Range => SORT_RANGE,
        };
    }

    if index.kind() == IndexKind::Global {
        score += GLOBAL_BONUS;
    }
    if *index.projection_mode() == Projection::All {
        score += FULL_PROJECTION_BONUS;
    }

    score
}

/// Pick the highest-scoring candidate. Ties keep the earlier candidate.
///
/// Returns `None` when no partition-key equality exists or nothing reaches
/// `MIN_USABLE_SCORE`; the caller then decides whether to scan.
#[must_use]
pub fn select_optimal<'a>(
    required: &RequiredKeys,
    candidates: &'a [IndexSpec],
) -> Option<&'a IndexSpec> {
    required.partition_key.as_ref()?;

    let mut best: Option<(&IndexSpec, u32)> = None;
    for candidate in candidates {
        let s = score(candidate, required);
        if best.is_none_or(|(_, top)| s > top) {
            best = Some((candidate, s));
        }
    }

    let selected = best
        .filter(|(_, s)| *s >= MIN_USABLE_SCORE)
        .map(|(index, _)| index);

    match (selected, best) {
        (Some(index), Some((_, s))) => {
            let label = if index.is_primary() { "<table>" } else { index.name() };
            tracing::debug!(index = label, score = s, "selected index");
        }
        _ => tracing::debug!(partition_key = ?required.partition_key, "no usable index"),
    }

    selected
}
