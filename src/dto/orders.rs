use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}
