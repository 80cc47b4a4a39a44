use crate::{
    client::ApiClient,
    dto::orders::CheckoutResponse,
    error::AppResult,
    services::cart_service::Cart,
};

/// Submits `cart` as an order. An empty cart fails before any request.
pub async fn checkout(client: &ApiClient, cart: &Cart) -> AppResult<CheckoutResponse> {
    let request = cart.to_checkout_request()?;
    let order = client.checkout(&request).await?;
    tracing::info!(
        order_id = order.order_id,
        total = %order.total,
        items = request.items.len(),
        "checkout complete"
    );
    Ok(order)
}
