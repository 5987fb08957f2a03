use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::reconcile::Catalog;

/// How a sale price compares with the product's regular price across stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarketComparison {
    pub(crate) average_price: Option<Decimal>,
    pub(crate) market_savings_percent: Option<i64>,
}

/// Mean of the given prices, rounded to cents. `None` when there are no
/// prices or the sum does not fit a `Decimal`.
pub(crate) fn average_price(prices: &[Decimal]) -> Option<Decimal> {
    if prices.is_empty() {
        return None;
    }
    let sum = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))?;
    let mean = sum.checked_div(Decimal::from(prices.len()))?;
    Some(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Whole-number percentage saved against `average`. Negative when the sale
/// costs more than the market. Halves round up (`-20.5` becomes `-20`).
/// A ratio too large for `Decimal` is treated as no data.
pub(crate) fn savings_percent(average: Option<Decimal>, sale: Decimal) -> Option<i64> {
    let average = average.filter(|a| !a.is_zero())?;
    let ratio = average
        .checked_sub(sale)?
        .checked_div(average)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    ratio.checked_add(Decimal::new(5, 1))?.floor().to_i64()
}

pub(crate) fn compare(catalog: &Catalog, product_id: i64, sale: Decimal) -> MarketComparison {
    let average_price = average_price(&catalog.prices_for(product_id));
    MarketComparison {
        average_price,
        market_savings_percent: savings_percent(average_price, sale),
    }
}

#[cfg(test)]
mod tests;
