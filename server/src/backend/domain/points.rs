//! Magic points arithmetic.
//!
//! A child pays for gifts with two currencies: behavior points (`score365`)
//! and the neighbor balance, which is held in cents and converts to points at
//! 100 cents per point. Deductions always drain `score365` first and spill the
//! remainder into the neighbor balance. Refunds put back exactly what was taken.

/// Neighbor balance cents that make up one magic point
pub const CENTS_PER_POINT: i64 = 100;

/// Upper bound of `score365`
pub const MAX_SCORE: u32 = 365;

/// Points a gift costs: its price rounded up to whole dollars
pub fn cost_in_points(price_cents: i64) -> u32 {
    if price_cents <= 0 {
        return 0;
    }
    let points = (price_cents + CENTS_PER_POINT - 1) / CENTS_PER_POINT;
    u32::try_from(points).unwrap_or(u32::MAX)
}

/// Whole points held in a neighbor balance
pub fn neighbor_points(neighbor_cents: i64) -> u32 {
    if neighbor_cents <= 0 {
        return 0;
    }
    u32::try_from(neighbor_cents / CENTS_PER_POINT).unwrap_or(u32::MAX)
}

/// Points a child can spend right now
pub fn available_points(score365: u32, neighbor_cents: i64) -> u32 {
    score365.saturating_add(neighbor_points(neighbor_cents))
}

/// Clamp an arbitrary score into 0..=365
pub fn clamp_score(value: i64) -> u32 {
    value.clamp(0, i64::from(MAX_SCORE)) as u32
}

/// How a gift's cost was split between the two currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointsDeduction {
    pub points: u32,
    pub from_score: u32,
    pub neighbor_cents: i64,
}

/// Where refunded value lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRefund {
    pub to_score: u32,
    pub to_neighbor_cents: i64,
}

/// Split `cost` points across score and neighbor balance.
/// Returns `None` when the child cannot afford it.
pub fn plan_deduction(score365: u32, neighbor_cents: i64, cost: u32) -> Option<PointsDeduction> {
    if available_points(score365, neighbor_cents) < cost {
        return None;
    }

    let from_score = score365.min(cost);
    let spill = cost - from_score;

    Some(PointsDeduction {
        points: cost,
        from_score,
        neighbor_cents: i64::from(spill) * CENTS_PER_POINT,
    })
}

/// Plan the reversal of `deduction` for a child currently at `score365`.
///
/// Score points come back up to the 365 cap; anything above it is converted
/// into neighbor cents so no value is lost.
pub fn plan_refund(score365: u32, deduction: &PointsDeduction) -> PointsRefund {
    let headroom = MAX_SCORE.saturating_sub(score365);
    let to_score = deduction.from_score.min(headroom);
    let overflow = deduction.from_score - to_score;

    PointsRefund {
        to_score,
        to_neighbor_cents: deduction.neighbor_cents + i64::from(overflow) * CENTS_PER_POINT,
    }
}
