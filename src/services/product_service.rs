use std::{cmp::Ordering, str::FromStr};

use rust_decimal::Decimal;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{
    dto::products::CreateProductRequest,
    error::{AppError, AppResult},
    models::Product,
    params::{FilterSortState, SortDirection, SortField},
};

/// Filters `products` by `query` and orders the survivors by `field`.
///
/// The query is trimmed and matched case-insensitively as a substring of the
/// decimal id or of the name. Products without a name can still match by id.
/// Sorting is stable and `direction` flips the comparison rather than the
/// output, so equal keys keep their input order either way.
pub fn compute_view(
    products: &[Product],
    query: &str,
    field: SortField,
    direction: SortDirection,
) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    let mut view: Vec<Product> = products
        .iter()
        .filter(|p| matches_query(p, &needle))
        .cloned()
        .collect();

    view.sort_by(|a, b| {
        let ord = compare_by(a, b, field);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    view
}

pub fn compute_view_for(products: &[Product], state: &FilterSortState) -> Vec<Product> {
    compute_view(products, &state.query, state.sort_field, state.sort_direction)
}

fn matches_query(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    product.id.to_string().contains(needle)
        || product
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}

fn compare_by(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Name => locale_cmp(
            a.name.as_deref().unwrap_or_default(),
            b.name.as_deref().unwrap_or_default(),
        ),
        SortField::InStock => locale_cmp(bool_label(a.in_stock), bool_label(b.in_stock)),
    }
}

fn bool_label(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Dictionary-style ordering in three passes: base letters with accents and
/// case ignored, then accents (unaccented first), then case (lower-case
/// first). "apple" < "Apple" < "Éclair" < "eclairs" < "Fudge".
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| {
            for (x, y) in a.nfd().zip(b.nfd()) {
                if x == y {
                    continue;
                }
                return match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(&y),
                };
            }
            a.len().cmp(&b.len())
        })
}

fn base_letters(raw: &str) -> impl Iterator<Item = char> + '_ {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn folded(raw: &str) -> impl Iterator<Item = char> + '_ {
    raw.nfd().flat_map(char::to_lowercase)
}

/// Raw text of the add/edit product form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub id: String,
    pub name: String,
    pub price: String,
    pub in_stock: bool,
}

impl ProductForm {
    /// Parses every field, refusing the submission on the first bad one.
    pub fn validate(&self) -> AppResult<CreateProductRequest> {
        let id = self
            .id
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("id must be a whole number, got '{}'", self.id)))?;
        if id <= 0 {
            return Err(AppError::Validation("id must be positive".into()));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }

        let price = Decimal::from_str(self.price.trim())
            .map_err(|_| AppError::Validation(format!("price must be a number, got '{}'", self.price)))?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(AppError::Validation("price cannot be negative".into()));
        }

        Ok(CreateProductRequest {
            id,
            name: name.to_string(),
            price,
            in_stock: self.in_stock,
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone().unwrap_or_default(),
            price: product.price.to_string(),
            in_stock: product.in_stock,
        }
    }
}
