//! Run one checkout from JSON files.

use std::path::Path;

use pupusas_core::CartItem;
use pupusas_storefront::{Checkout, CheckoutPayload, StoreHandle, StorefrontConfig};
use tracing::info;

use super::{CommandError, read_json};

/// Fill a cart from `cart_path`, check out with the details in `customer_path`,
/// and print the resulting customer record.
///
/// With `wait`, sleeps through the reset delay so the final cart state is logged.
///
/// # Errors
///
/// Returns an error if either file is unreadable or the checkout fails.
pub async fn run(
    config: &StorefrontConfig,
    cart_path: &Path,
    customer_path: &Path,
    wait: bool,
) -> Result<(), CommandError> {
    let items: Vec<CartItem> = read_json(cart_path).await?;
    let payload: CheckoutPayload = read_json(customer_path).await?;

    let checkout = Checkout::from_config(config, StoreHandle::new());
    let store = checkout.store();
    for item in items {
        store.add_to_cart(item)?;
    }
    info!(
        count = store.cart_count(),
        total = %store.cart_total(),
        "Cart ready"
    );

    let result = checkout.checkout(&payload).await;

    if wait && !store.status().is_busy() {
        tokio::time::sleep(config.reset_delay).await;
        tokio::task::yield_now().await;
        info!(
            status = %store.status(),
            count = store.cart_count(),
            "Cart after reset"
        );
    }

    let customer = result?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&customer)?);
    }

    Ok(())
}
