use std::collections::HashMap;

use crate::{
    dto::orders::CheckoutResponse,
    error::{AppError, AppResult},
    models::Product,
    params::{FilterSortState, SortDirection, SortField},
    services::{
        cart_service::Cart,
        product_service::{ProductForm, compute_view_for},
    },
};

/// Network-backed actions whose responses are tracked. Deletes are keyed by
/// product, so removing two different products never makes either stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchProducts,
    SaveProduct,
    DeleteProduct(i64),
    Checkout,
}

impl Operation {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Operation::FetchProducts => "Failed to fetch products",
            Operation::SaveProduct => "Operation failed",
            Operation::DeleteProduct(_) => "Delete failed",
            Operation::Checkout => "Checkout failed",
        }
    }
}

/// Identifies one issued request. Only the newest token per operation is
/// allowed to change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    operation: Operation,
    seq: u64,
}

impl RequestToken {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    next_seq: u64,
    latest: HashMap<Operation, u64>,
}

impl RequestTracker {
    pub fn begin(&mut self, operation: Operation) -> RequestToken {
        self.next_seq += 1;
        self.latest.insert(operation, self.next_seq);
        RequestToken {
            operation,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.get(&token.operation) == Some(&token.seq)
    }

    /// Marks `token` done. Returns false, changing nothing, when a newer
    /// request for the same operation has been issued since.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.latest.remove(&token.operation);
        true
    }

    pub fn is_pending(&self, operation: Operation) -> bool {
        self.latest.contains_key(&operation)
    }

    pub fn any_pending(&self) -> bool {
        !self.latest.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update(i64),
}

/// Everything the storefront screen shows, changed only through the
/// methods below.
#[derive(Debug, Default, Clone)]
pub struct AppState {
    pub products: Vec<Product>,
    pub filter: FilterSortState,
    pub cart: Cart,
    pub form: ProductForm,
    pub edit_id: Option<i64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub dark_mode: bool,
    requests: RequestTracker,
}

impl AppState {
    pub fn new(dark_mode: bool) -> Self {
        Self {
            dark_mode,
            ..Self::default()
        }
    }

    pub fn view(&self) -> Vec<Product> {
        compute_view_for(&self.products, &self.filter)
    }

    pub fn loading(&self) -> bool {
        self.requests.any_pending()
    }

    pub fn is_pending(&self, operation: Operation) -> bool {
        self.requests.is_pending(operation)
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    pub fn set_sort(&mut self, field: SortField, direction: SortDirection) {
        self.filter.sort_field = field;
        self.filter.sort_direction = direction;
    }

    /// Header-click behaviour: the active column flips direction, another
    /// column starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.filter.sort_field == field {
            self.filter.sort_direction = self.filter.sort_direction.toggled();
        } else {
            self.set_sort(field, SortDirection::Asc);
        }
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    /// Loads `product_id` into the form. False if it is not in the list.
    pub fn begin_edit(&mut self, product_id: i64) -> bool {
        match self.products.iter().find(|p| p.id == product_id) {
            Some(product) => {
                self.form = ProductForm::from(product);
                self.edit_id = Some(product_id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form = ProductForm::default();
        self.edit_id = None;
    }

    pub fn save_mode(&self) -> SaveMode {
        match self.edit_id {
            Some(id) => SaveMode::Update(id),
            None => SaveMode::Create,
        }
    }

    pub fn toggle_select(&mut self, product_id: i64) {
        self.cart = self.cart.toggle_select(product_id);
    }

    pub fn set_quantity(&mut self, product_id: i64, raw: &str) {
        self.cart = self.cart.set_quantity(product_id, raw);
    }

    pub fn begin(&mut self, operation: Operation) -> RequestToken {
        if matches!(operation, Operation::SaveProduct | Operation::Checkout) {
            self.message = None;
            self.error = None;
        }
        self.requests.begin(operation)
    }

    /// Reports a failure that stopped an action before any request was sent.
    pub fn reject(&mut self, err: &AppError) {
        self.message = None;
        self.error = Some(err.to_string());
    }

    /// Like [`AppState::reject`] for untracked reads, preferring the API detail.
    pub fn reject_with(&mut self, err: &AppError, fallback: &str) {
        self.message = None;
        self.error = Some(err.user_message(fallback));
    }

    pub fn finish_fetch(&mut self, token: RequestToken, result: AppResult<Vec<Product>>) -> bool {
        if !self.accept(token) {
            return false;
        }
        match result {
            Ok(products) => {
                self.cart = self.cart.retain_products(&products);
                if self
                    .edit_id
                    .is_some_and(|id| !products.iter().any(|p| p.id == id))
                {
                    self.cancel_edit();
                }
                self.products = products;
                self.error = None;
            }
            Err(err) => self.fail(token, &err),
        }
        true
    }

    pub fn finish_save(
        &mut self,
        token: RequestToken,
        mode: SaveMode,
        result: AppResult<Product>,
    ) -> bool {
        if !self.accept(token) {
            return false;
        }
        match result {
            Ok(product) => {
                match self.products.iter_mut().find(|p| p.id == product.id) {
                    Some(existing) => *existing = product,
                    None => self.products.push(product),
                }
                self.message = Some(
                    match mode {
                        SaveMode::Create => "Product added",
                        SaveMode::Update(_) => "Product updated",
                    }
                    .to_string(),
                );
                self.cancel_edit();
            }
            Err(err) => self.fail(token, &err),
        }
        true
    }

    /// Applies a delete result; the product id comes from the token.
    pub fn finish_delete(&mut self, token: RequestToken, result: AppResult<()>) -> bool {
        let Operation::DeleteProduct(product_id) = token.operation else {
            tracing::warn!(operation = ?token.operation, "not a delete token");
            return false;
        };
        if !self.accept(token) {
            return false;
        }
        match result {
            Ok(()) => {
                self.products.retain(|p| p.id != product_id);
                self.cart = self.cart.remove(product_id);
                if self.edit_id == Some(product_id) {
                    self.cancel_edit();
                }
            }
            Err(err) => self.fail(token, &err),
        }
        true
    }

    pub fn finish_checkout(
        &mut self,
        token: RequestToken,
        result: AppResult<CheckoutResponse>,
    ) -> bool {
        if !self.accept(token) {
            return false;
        }
        match result {
            Ok(order) => {
                self.cart = self.cart.clear();
                self.message = Some(format!(
                    "Order #{} placed, total ${:.2}",
                    order.order_id, order.total
                ));
            }
            Err(err) => self.fail(token, &err),
        }
        true
    }

    fn accept(&mut self, token: RequestToken) -> bool {
        let accepted = self.requests.complete(token);
        if !accepted {
            tracing::debug!(operation = ?token.operation, "discarding stale response");
        }
        accepted
    }

    fn fail(&mut self, token: RequestToken, err: &AppError) {
        tracing::warn!(operation = ?token.operation, error = %err, "request failed");
        self.error = Some(err.user_message(token.operation.fallback_message()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use rust_decimal::Decimal;

    fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            name: Some(name.to_string()),
            price: Decimal::new(id * 100, 2),
            in_stock: true,
        }
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        let token = state.begin(Operation::FetchProducts);
        state.finish_fetch(token, Ok(vec![product(1, "Laptop"), product(2, "Tablet")]));
        state
    }

    #[test]
    fn fetch_replaces_products_and_clears_loading() {
        let mut state = AppState::default();
        let token = state.begin(Operation::FetchProducts);
        assert!(state.loading());
        assert!(state.finish_fetch(token, Ok(vec![product(1, "Laptop")])));
        assert!(!state.loading());
        assert_eq!(state.products.len(), 1);
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut state = AppState::default();
        let first = state.begin(Operation::FetchProducts);
        let second = state.begin(Operation::FetchProducts);

        assert!(state.finish_fetch(second, Ok(vec![product(2, "Tablet")])));
        assert!(!state.finish_fetch(first, Ok(vec![product(1, "Laptop")])));
        assert_eq!(state.products, vec![product(2, "Tablet")]);
        assert!(!state.loading());
    }

    #[test]
    fn stale_response_keeps_loading_until_newest_arrives() {
        let mut state = AppState::default();
        let first = state.begin(Operation::FetchProducts);
        let second = state.begin(Operation::FetchProducts);
        assert!(!state.finish_fetch(first, Ok(vec![])));
        assert!(state.loading());
        assert!(state.finish_fetch(second, Ok(vec![])));
        assert!(!state.loading());
    }

    #[test]
    fn fetch_failure_surfaces_detail_or_fallback() {
        let mut state = AppState::default();
        let token = state.begin(Operation::FetchProducts);
        state.finish_fetch(
            token,
            Err(AppError::Api {
                status: StatusCode::SERVICE_UNAVAILABLE,
                detail: None,
            }),
        );
        assert_eq!(state.error.as_deref(), Some("Failed to fetch products"));

        let token = state.begin(Operation::SaveProduct);
        state.finish_save(
            token,
            SaveMode::Create,
            Err(AppError::Api {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                detail: Some("Product already exists".into()),
            }),
        );
        assert_eq!(state.error.as_deref(), Some("Product already exists"));
    }

    #[test]
    fn fetch_prunes_cart_of_vanished_products() {
        let mut state = loaded();
        state.toggle_select(1);
        state.toggle_select(2);
        let token = state.begin(Operation::FetchProducts);
        state.finish_fetch(token, Ok(vec![product(2, "Tablet")]));
        assert!(!state.cart.contains(1));
        assert!(state.cart.contains(2));
    }

    #[test]
    fn delete_prunes_cart_and_list() {
        let mut state = loaded();
        state.toggle_select(1);
        state.begin_edit(1);
        let token = state.begin(Operation::DeleteProduct(1));
        state.finish_delete(token, Ok(()));
        assert!(state.cart.is_empty());
        assert_eq!(state.products, vec![product(2, "Tablet")]);
        assert_eq!(state.edit_id, None);
    }

    #[test]
    fn failed_delete_keeps_cart() {
        let mut state = loaded();
        state.toggle_select(1);
        let token = state.begin(Operation::DeleteProduct(1));
        state.finish_delete(
            token,
            Err(AppError::Api {
                status: StatusCode::NOT_FOUND,
                detail: None,
            }),
        );
        assert!(state.cart.contains(1));
        assert_eq!(state.error.as_deref(), Some("Delete failed"));
    }

    #[test]
    fn overlapping_deletes_of_different_products_both_apply() {
        let mut state = loaded();
        state.toggle_select(1);
        state.toggle_select(2);
        let first = state.begin(Operation::DeleteProduct(1));
        let second = state.begin(Operation::DeleteProduct(2));

        assert!(state.finish_delete(first, Ok(())));
        assert!(state.finish_delete(
            second,
            Err(AppError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: None,
            }),
        ));
        assert_eq!(state.products, vec![product(2, "Tablet")]);
        assert!(!state.cart.contains(1));
        assert!(state.cart.contains(2));
        assert_eq!(state.error.as_deref(), Some("Delete failed"));
        assert!(!state.loading());
    }

    #[test]
    fn repeated_delete_of_same_product_keeps_newest() {
        let mut state = loaded();
        let first = state.begin(Operation::DeleteProduct(1));
        let second = state.begin(Operation::DeleteProduct(1));
        assert!(!state.finish_delete(first, Ok(())));
        assert!(state.is_pending(Operation::DeleteProduct(1)));
        assert!(state.finish_delete(second, Ok(())));
        assert_eq!(state.products, vec![product(2, "Tablet")]);
    }

    #[test]
    fn finish_delete_refuses_other_tokens() {
        let mut state = loaded();
        let token = state.begin(Operation::Checkout);
        assert!(!state.finish_delete(token, Ok(())));
        assert_eq!(state.products.len(), 2);
        assert!(state.is_pending(Operation::Checkout));
    }

    #[test]
    fn edit_then_save_updates_message_and_resets_form() {
        let mut state = loaded();
        assert!(state.begin_edit(2));
        assert_eq!(state.form.name, "Tablet");
        assert_eq!(state.save_mode(), SaveMode::Update(2));

        let mode = state.save_mode();
        let token = state.begin(Operation::SaveProduct);
        state.finish_save(token, mode, Ok(product(2, "Tablet Pro")));
        assert_eq!(state.message.as_deref(), Some("Product updated"));
        assert_eq!(state.edit_id, None);
        assert_eq!(state.form, ProductForm::default());
        assert_eq!(state.products[1].name.as_deref(), Some("Tablet Pro"));
    }

    #[test]
    fn begin_edit_of_unknown_product_is_refused() {
        let mut state = loaded();
        assert!(!state.begin_edit(42));
        assert_eq!(state.save_mode(), SaveMode::Create);
    }

    #[test]
    fn checkout_success_clears_cart() {
        let mut state = loaded();
        state.toggle_select(1);
        state.set_quantity(1, "3");
        let token = state.begin(Operation::Checkout);
        state.finish_checkout(
            token,
            Ok(CheckoutResponse {
                order_id: 7,
                total: Decimal::new(300, 2),
            }),
        );
        assert!(state.cart.is_empty());
        assert_eq!(state.message.as_deref(), Some("Order #7 placed, total $3.00"));
    }

    #[test]
    fn checkout_failure_keeps_cart() {
        let mut state = loaded();
        state.toggle_select(1);
        let token = state.begin(Operation::Checkout);
        state.finish_checkout(
            token,
            Err(AppError::Api {
                status: StatusCode::BAD_REQUEST,
                detail: Some("Insufficient stock".into()),
            }),
        );
        assert!(state.cart.contains(1));
        assert_eq!(state.error.as_deref(), Some("Insufficient stock"));
    }

    #[test]
    fn sort_by_same_field_flips_direction() {
        let mut state = loaded();
        state.sort_by(SortField::Id);
        assert_eq!(state.filter.sort_direction, SortDirection::Desc);
        assert_eq!(state.view()[0].id, 2);

        state.sort_by(SortField::Name);
        assert_eq!(state.filter.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn view_applies_query() {
        let mut state = loaded();
        state.set_query("lap");
        let view = state.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 1);
    }

    #[test]
    fn reject_reports_empty_cart_inline() {
        let mut state = loaded();
        state.reject(&AppError::EmptyCart);
        assert_eq!(state.error.as_deref(), Some("Cart is empty"));
        assert!(!state.loading());
    }

    #[test]
    fn tokens_are_tracked_per_operation() {
        let mut state = AppState::default();
        let fetch = state.begin(Operation::FetchProducts);
        let checkout = state.begin(Operation::Checkout);
        assert_eq!(checkout.operation(), Operation::Checkout);
        assert!(state.finish_fetch(fetch, Ok(vec![])));
        assert!(state.is_pending(Operation::Checkout));
    }
}
