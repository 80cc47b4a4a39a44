use crate::{
    client::ApiClient,
    dto::products::UpdateProductRequest,
    models::Product,
    services::order_service,
    state::{AppState, Operation, SaveMode},
};

/// Drives [`AppState`] from API calls. Each action issues a request token,
/// awaits the call and hands the outcome back through the state so stale
/// results never land. Successful writes re-fetch the list.
///
/// Every action returns whether it succeeded; details are in
/// `state().message` / `state().error`.
#[derive(Debug)]
pub struct Storefront {
    client: ApiClient,
    state: AppState,
}

impl Storefront {
    pub fn new(client: ApiClient, state: AppState) -> Self {
        Self { client, state }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub async fn refresh(&mut self) -> bool {
        let token = self.state.begin(Operation::FetchProducts);
        let result = self.client.list_products().await;
        let ok = result.is_ok();
        self.state.finish_fetch(token, result) && ok
    }

    pub async fn fetch_one(&mut self, id: i64) -> Option<Product> {
        match self.client.get_product(id).await {
            Ok(product) => Some(product),
            Err(err) => {
                self.state.reject_with(&err, "Product not found");
                None
            }
        }
    }

    /// Validates the current form and creates or updates the product.
    pub async fn save_product(&mut self) -> bool {
        let payload = match self.state.form.validate() {
            Ok(payload) => payload,
            Err(err) => {
                self.state.reject(&err);
                return false;
            }
        };

        let mode = self.state.save_mode();
        let token = self.state.begin(Operation::SaveProduct);
        let result = match mode {
            SaveMode::Create => self.client.create_product(&payload).await,
            SaveMode::Update(id) => {
                self.client
                    .update_product(id, &UpdateProductRequest::from(payload))
                    .await
            }
        };
        let ok = result.is_ok();
        if !self.state.finish_save(token, mode, result) || !ok {
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn delete_product(&mut self, id: i64) -> bool {
        let token = self.state.begin(Operation::DeleteProduct(id));
        let result = self.client.delete_product(id).await;
        let ok = result.is_ok();
        if !self.state.finish_delete(token, result) || !ok {
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn checkout(&mut self) -> bool {
        if let Err(err) = self.state.cart.to_checkout_request() {
            self.state.reject(&err);
            return false;
        }

        let token = self.state.begin(Operation::Checkout);
        let result = order_service::checkout(&self.client, &self.state.cart).await;
        let ok = result.is_ok();
        if !self.state.finish_checkout(token, result) || !ok {
            return false;
        }
        self.refresh().await;
        true
    }
}
