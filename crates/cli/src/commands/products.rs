//! Print the catalog's product listing.

use pupusas_storefront::{ContentClient, StoreHandle, StorefrontConfig, load_catalog};
use tracing::warn;

use super::CommandError;

/// Load the catalog and print its `products` field as pretty JSON.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched or encoded.
pub async fn run(config: &StorefrontConfig) -> Result<(), CommandError> {
    let store = StoreHandle::new();
    let client = ContentClient::new(&config.content);

    load_catalog(&client, &store).await?;

    match store.featured_products() {
        Some(products) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{}", serde_json::to_string_pretty(&products)?);
            }
        }
        None => warn!("Catalog has no products field"),
    }

    Ok(())
}
