use std::cmp::Ordering;

use crate::models::Payout;

/// Pending payouts ordered by eviction preference: smallest amount first,
/// source order on ties, unparsable amounts last.
///
/// This is the list shown to operators, and button indices resolve against it.
pub fn ranked_candidates(pending: &[Payout]) -> Vec<Payout> {
    let mut ranked: Vec<Payout> = pending.to_vec();
    // sort_by is stable, so equal amounts keep source order
    ranked.sort_by(|a, b| match (a.amount_value(), b.amount_value()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked
}

/// The pending payout with the smallest amount, first occurrence on ties.
pub fn choose_victim(pending: &[Payout]) -> Option<&Payout> {
    let mut victim: Option<(&Payout, f64)> = None;
    for payout in pending {
        let Some(amount) = payout.amount_value() else {
            continue;
        };
        match victim {
            Some((_, smallest)) if amount >= smallest => {}
            _ => victim = Some((payout, amount)),
        }
    }
    victim.map(|(payout, _)| payout)
}
