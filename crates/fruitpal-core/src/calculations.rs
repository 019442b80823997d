use tracing::debug;

use crate::error::{FruitpalError, Result};
use crate::models::{CostLine, TradeRecord};

// ── CostCalculator ────────────────────────────────────────────────────────────

/// Stateless trade-cost computation and ranking.
pub struct CostCalculator;

impl CostCalculator {
    /// Reject negative (or NaN) price and volume before any data is read.
    pub fn validate_trade_args(price_per_ton: f64, trade_volume: f64) -> Result<()> {
        let out_of_range = |v: f64| v.is_nan() || v < 0.0;
        if out_of_range(price_per_ton) || out_of_range(trade_volume) {
            return Err(FruitpalError::InvalidArgument(
                "trade_volume and price_per_ton arguments must be greater than or equal to zero."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Total cost of trading `trade_volume` tons through `record`:
    /// `volume * (price + variable_overhead) + fixed_overhead`.
    pub fn total_cost(record: &TradeRecord, price_per_ton: f64, trade_volume: f64) -> f64 {
        trade_volume * (price_per_ton + record.variable_overhead) + record.fixed_overhead
    }

    /// Cost every record of `commodity` and rank the results.
    ///
    /// Ordering is descending by total; equal totals keep input order.
    /// Fails with [`FruitpalError::NotFound`] when nothing matches.
    pub fn compute_cost(
        records: &[TradeRecord],
        commodity: &str,
        price_per_ton: f64,
        trade_volume: f64,
    ) -> Result<Vec<CostLine>> {
        Self::validate_trade_args(price_per_ton, trade_volume)?;

        let wanted = commodity.to_lowercase();
        let mut lines: Vec<CostLine> = records
            .iter()
            .filter(|r| r.matches_commodity(&wanted))
            .map(|r| CostLine {
                country: r.country.clone(),
                total_cost: Self::total_cost(r, price_per_ton, trade_volume),
                price_per_ton,
                variable_overhead: r.variable_overhead,
                trade_volume,
                fixed_overhead: r.fixed_overhead,
            })
            .collect();

        if lines.is_empty() {
            return Err(FruitpalError::NotFound(wanted));
        }

        // `sort_by` is stable, which gives the input-order tie-break.
        lines.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));

        debug!(
            commodity = %wanted,
            matches = lines.len(),
            "ranked trade costs"
        );
        Ok(lines)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
