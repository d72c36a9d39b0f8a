use std::cmp::Ordering;

pub const ACCEPTANCE_FLOOR: f64 = 0.5;
pub const AMOUNT_WEIGHT: f64 = 0.6;
pub const DATE_WEIGHT: f64 = 0.4;

const SCORE_EPSILON: f64 = 1e-9;

/// A scored pairing of one bank line with one accounting transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub transaction_id: i64,
    pub total_amount: f64,
    pub amount_delta: f64,
    pub date_delta_days: i64,
    pub score: f64,
}

/// Limits a candidate must stay within to enter the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchLimits {
    pub amount: f64,
    pub date_days: i64,
}

impl MatchLimits {
    pub fn admits(&self, amount_delta: f64, date_delta_days: i64) -> bool {
        amount_delta <= self.amount + SCORE_EPSILON && date_delta_days.abs() <= self.date_days
    }
}

// Linear falloff from 1.0 at zero delta to the floor at the limit.
fn closeness(delta: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return if delta <= SCORE_EPSILON { 1.0 } else { 0.0 };
    }
    let ratio = (delta / limit).clamp(0.0, 1.0);
    1.0 - (1.0 - ACCEPTANCE_FLOOR) * ratio
}

/// Composite score in [floor, 1.0] for a candidate inside `limits`.
pub fn score_candidate(amount_delta: f64, date_delta_days: i64, limits: &MatchLimits) -> f64 {
    let amount_factor = closeness(amount_delta.abs(), limits.amount);
    let date_factor = closeness(date_delta_days.abs() as f64, limits.date_days as f64);
    AMOUNT_WEIGHT * amount_factor + DATE_WEIGHT * date_factor
}

pub fn meets_floor(score: f64) -> bool {
    score + SCORE_EPSILON >= ACCEPTANCE_FLOOR
}

/// Orders by score desc, amount delta asc, transaction id asc.
pub fn rank_candidates(mut candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    candidates.sort_by(compare_candidates);
    candidates
}

fn compare_candidates(left: &MatchCandidate, right: &MatchCandidate) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| left.amount_delta.total_cmp(&right.amount_delta))
        .then_with(|| left.transaction_id.cmp(&right.transaction_id))
}

/// Match confidence in percent, rounded to two decimals.
pub fn match_confidence(bank_amount: f64, amount_delta: f64) -> f64 {
    if bank_amount <= 0.0 {
        return 0.0;
    }
    let raw = (100.0 - amount_delta.abs() / bank_amount * 100.0).clamp(0.0, 100.0);
    (raw * 100.0).round() / 100.0
}
