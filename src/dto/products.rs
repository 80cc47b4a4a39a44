use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Body of `POST /products/`. The id is chosen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub in_stock: bool,
}

/// Body of `PUT /products/{id}`. The API replaces the whole record, so every
/// field is sent, id included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub in_stock: bool,
}

impl From<CreateProductRequest> for UpdateProductRequest {
    fn from(value: CreateProductRequest) -> Self {
        Self {
            id: value.id,
            name: value.name,
            price: value.price,
            in_stock: value.in_stock,
        }
    }
}

impl From<CreateProductRequest> for Product {
    fn from(value: CreateProductRequest) -> Self {
        Self {
            id: value.id,
            name: Some(value.name),
            price: value.price,
            in_stock: value.in_stock,
        }
    }
}
