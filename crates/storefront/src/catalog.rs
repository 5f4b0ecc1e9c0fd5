//! One-shot catalog load at application start.

use tracing::{info, instrument};

use crate::content::ContentError;
use crate::ports::CatalogSource;
use crate::state::StoreHandle;

/// Fetch the catalog and store it verbatim.
///
/// Called once during initialization. There is no refresh and no retry; a failure
/// leaves the store without a catalog and is returned to the caller.
///
/// # Errors
///
/// Returns the source's error if the fetch fails.
#[instrument(skip_all)]
pub async fn load_catalog(
    source: &dyn CatalogSource,
    store: &StoreHandle,
) -> Result<(), ContentError> {
    let catalog = source.fetch_catalog().await?;
    info!(products = catalog.product_count(), "Catalog loaded");
    store.set_products(catalog);
    Ok(())
}
