//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::AdminCatalogClient;
use crate::config::AdminConfig;
use crate::media::CloudinaryClient;
use crate::services::ProductListView;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    catalog: AdminCatalogClient,
    media: CloudinaryClient,
    products: ProductListView,
}

impl AppState {
    /// Build the state and its backend clients from configuration.
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let catalog = AdminCatalogClient::new(&config.api_url);
        let media = CloudinaryClient::new(config.cloudinary.clone());
        let products = ProductListView::new(catalog.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                media,
                products,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &AdminCatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn media(&self) -> &CloudinaryClient {
        &self.inner.media
    }

    /// The server-held product list view.
    #[must_use]
    pub fn products(&self) -> &ProductListView {
        &self.inner.products
    }
}
