use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Sale {
    pub id: Option<i64>,
    pub import_id: i64,
    pub item_name: String,
    pub category_id: i64,
    pub store_id: i64,
    pub regular_price: Decimal,
    pub sale_price: Decimal,
    pub expires_at: Option<NaiveDate>,
    pub created_at: String,
}

impl Sale {
    /// Amount saved against this store's own regular price. Never negative.
    pub fn discount(&self) -> Decimal {
        (self.regular_price - self.sale_price).max(Decimal::ZERO)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at.is_some_and(|d| d < today)
    }
}
