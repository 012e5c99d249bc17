//! Server-held product list view with optimistic delete and restore.
//!
//! The admin UI shows one list at a time. Delete and restore change that
//! list before the backend answers and put it back if the backend refuses.
//! Refreshes run as spawned tasks; starting a new one aborts the previous
//! fetch so a slow response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use minimoda_core::{
    ListingState, OptimisticError, OptimisticList, PageRequest, PendingAction, Product,
    ProductFilter, ProductId, ProductStatus,
};
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{info, instrument, warn};

use crate::catalog::{AdminCatalogClient, BackendError};
use crate::error::{AppError, Result};
use crate::models::AdminToken;

#[derive(Debug, Default)]
struct ViewState {
    list: OptimisticList<Product>,
    listing: ListingState,
    limit: u32,
    total: u64,
    loaded: bool,
}

/// The list view as returned to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub products: Vec<Product>,
    pub filter: ProductFilter,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    /// Whether a refresh has ever completed.
    pub loaded: bool,
    /// Product with an action awaiting the backend.
    pub pending: Option<ProductId>,
}

impl ViewState {
    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            products: self.list.items().to_vec(),
            filter: self.listing.filter.clone(),
            page: self.listing.page,
            limit: self.limit,
            total: self.total,
            loaded: self.loaded,
            pending: self.list.pending_key().cloned(),
        }
    }

    /// Whether deleted products are filtered out of this view.
    fn hides_deleted(&self) -> bool {
        self.listing.filter.status.is_some_and(|s| !s.is_deleted())
    }

    /// Whether only deleted products are shown.
    fn only_deleted(&self) -> bool {
        self.listing.filter.status.is_some_and(ProductStatus::is_deleted)
    }
}

/// Shared handle to the admin product list view.
#[derive(Clone)]
pub struct ProductListView {
    inner: Arc<ProductListViewInner>,
}

struct ProductListViewInner {
    catalog: AdminCatalogClient,
    state: tokio::sync::Mutex<ViewState>,
    refresh: Mutex<Option<AbortHandle>>,
    generation: AtomicU64,
}

impl ProductListView {
    #[must_use]
    pub fn new(catalog: AdminCatalogClient) -> Self {
        Self {
            inner: Arc::new(ProductListViewInner {
                catalog,
                state: tokio::sync::Mutex::new(ViewState {
                    limit: PageRequest::DEFAULT_LIMIT,
                    ..ViewState::default()
                }),
                refresh: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current contents of the view.
    pub async fn snapshot(&self) -> ViewSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Refetch the view for a filter and page.
    ///
    /// A changed filter sends the view back to page 1.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a newer refresh started before this one
    /// finished, or the backend error if the fetch failed.
    #[instrument(skip(self, token))]
    pub async fn refresh(
        &self,
        token: &AdminToken,
        filter: ProductFilter,
        requested: PageRequest,
    ) -> Result<ViewSnapshot> {
        let mut listing = self.inner.state.lock().await.listing.clone();
        let page = listing.apply(filter, requested);

        let catalog = self.inner.catalog.clone();
        let task_token = token.clone();
        let task_filter = listing.filter.clone();
        let task = tokio::spawn(async move {
            catalog
                .list_products(&task_token, &task_filter, page)
                .await
        });

        let generation = self.supersede(task.abort_handle());

        let fetched = match task.await {
            Ok(result) => result?,
            Err(e) if e.is_cancelled() => {
                info!(generation, "Refresh superseded");
                return Err(superseded());
            }
            Err(e) => return Err(AppError::Internal(format!("refresh task failed: {e}"))),
        };

        let mut state = self.inner.state.lock().await;
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            info!(generation, "Discarding stale refresh");
            return Err(superseded());
        }

        state.list.replace_all(fetched.products);
        state.listing = listing;
        state.limit = fetched.limit;
        state.total = fetched.total;
        state.loaded = true;
        Ok(state.snapshot())
    }

    /// Register a refresh task as the current one and abort the previous.
    ///
    /// The generation is taken under the same lock as the handle swap, so
    /// the newest generation always owns the registered handle.
    fn supersede(&self, handle: AbortHandle) -> u64 {
        let (generation, previous) = {
            let mut current = self
                .inner
                .refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, current.replace(handle))
        };
        if let Some(previous) = previous {
            previous.abort();
        }
        generation
    }

    /// Soft delete a product.
    ///
    /// In a view that hides deleted products the row disappears; otherwise it
    /// is shown as deleted. The row is put back if the backend refuses.
    ///
    /// # Errors
    ///
    /// Returns `Optimistic` if another action is in flight, or the backend
    /// error after rolling back.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn soft_delete(&self, token: &AdminToken, id: &ProductId) -> Result<Product> {
        let pending = {
            let mut state = self.inner.state.lock().await;
            let remove = state.hides_deleted();
            admit(state.list.begin(id, |items| {
                if remove {
                    items.retain(|p| &p.id != id);
                } else {
                    for product in items.iter_mut().filter(|p| &p.id == id) {
                        product.status = ProductStatus::Deleted;
                    }
                }
            }))?
        };

        let result = self
            .inner
            .catalog
            .set_status(token, id, ProductStatus::Deleted)
            .await;
        self.settle(pending, result).await
    }

    /// Restore a soft-deleted product to the status its stock implies.
    ///
    /// # Errors
    ///
    /// Returns `Optimistic` if another action is in flight, or the backend
    /// error after rolling back.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn restore(&self, token: &AdminToken, id: &ProductId) -> Result<Product> {
        let (pending, known_status) = {
            let mut state = self.inner.state.lock().await;
            let remove = state.only_deleted();
            let known_status = state
                .list
                .items()
                .iter()
                .find(|p| &p.id == id)
                .map(Product::derived_status);
            let pending = admit(state.list.begin(id, |items| {
                if remove {
                    items.retain(|p| &p.id != id);
                } else {
                    for product in items.iter_mut().filter(|p| &p.id == id) {
                        product.status = product.derived_status();
                    }
                }
            }))?;
            (pending, known_status)
        };

        let result = match known_status {
            Some(status) => self.inner.catalog.set_status(token, id, status).await,
            None => self.restore_unlisted(token, id).await,
        };
        self.settle(pending, result).await
    }

    /// Restore a product the view does not show, reading its stock first.
    async fn restore_unlisted(
        &self,
        token: &AdminToken,
        id: &ProductId,
    ) -> std::result::Result<Product, BackendError> {
        let current = self.inner.catalog.get_product(token, id).await?;
        self.inner
            .catalog
            .set_status(token, id, current.derived_status())
            .await
    }

    /// Show a newer version of a product if it is displayed.
    pub async fn record(&self, product: Product) {
        let mut state = self.inner.state.lock().await;
        let matches = state.listing.filter.status.is_none_or(|s| s == product.status);
        if matches {
            state.list.replace_item(product);
        }
    }

    async fn settle(
        &self,
        pending: Option<PendingAction<ProductId>>,
        result: std::result::Result<Product, BackendError>,
    ) -> Result<Product> {
        let Some(pending) = pending else {
            return Ok(result?);
        };

        let mut state = self.inner.state.lock().await;
        match result {
            Ok(product) => {
                state.list.commit(pending, Some(product.clone()))?;
                Ok(product)
            }
            Err(e) => {
                warn!(
                    product_id = %pending.key(),
                    error = %e,
                    "Backend refused action, rolling back"
                );
                state.list.rollback(pending)?;
                Err(e.into())
            }
        }
    }
}

/// Products outside the view skip the optimistic step.
fn admit(
    begun: std::result::Result<PendingAction<ProductId>, OptimisticError>,
) -> Result<Option<PendingAction<ProductId>>> {
    match begun {
        Ok(pending) => Ok(Some(pending)),
        Err(OptimisticError::NotInList(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn superseded() -> AppError {
    AppError::Conflict("refresh superseded by a newer request".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use minimoda_core::{Genre, Price, Size, Variant};

    use super::*;

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            description: String::new(),
            genre: Genre::Boy,
            status: ProductStatus::Deleted,
            image: None,
            variants: vec![Variant::new(Size::T2, stock, Price::ZERO)],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_supersede_aborts_only_the_older_refresh() {
        let endpoint = url::Url::parse("http://localhost:4000/graphql").unwrap();
        let view = ProductListView::new(AdminCatalogClient::new(&endpoint));

        let older = tokio::spawn(std::future::pending::<()>());
        let newer = tokio::spawn(std::future::pending::<()>());
        let first = view.supersede(older.abort_handle());
        let second = view.supersede(newer.abort_handle());

        assert!(second > first);
        assert!(older.await.unwrap_err().is_cancelled());
        assert!(!newer.is_finished());
        newer.abort();
    }

    #[test]
    fn test_view_filter_modes() {
        let mut state = ViewState::default();
        assert!(!state.hides_deleted());
        assert!(!state.only_deleted());

        state.listing.filter.status = Some(ProductStatus::Available);
        assert!(state.hides_deleted());

        state.listing.filter.status = Some(ProductStatus::Deleted);
        assert!(state.only_deleted());
        assert!(!state.hides_deleted());
    }

    #[test]
    fn test_admit_skips_products_outside_view() {
        let mut list = OptimisticList::new(vec![product("1", 1)]);
        assert!(admit(list.begin(&ProductId::new("9"), |_| {})).unwrap().is_none());

        let pending = admit(list.begin(&ProductId::new("1"), |_| {})).unwrap().unwrap();
        assert!(matches!(
            admit(list.begin(&ProductId::new("9"), |_| {})),
            Err(AppError::Optimistic(OptimisticError::ActionInFlight { .. }))
        ));
        list.commit(pending, None).unwrap();
    }

    #[test]
    fn test_snapshot_reports_pending_action() {
        let mut state = ViewState {
            list: OptimisticList::new(vec![product("1", 0), product("2", 3)]),
            ..ViewState::default()
        };
        let pending = state.list.begin(&ProductId::new("2"), |_| {}).unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.products.len(), 2);
        assert_eq!(snapshot.pending, Some(ProductId::new("2")));
        assert!(!snapshot.loaded);
        state.list.rollback(pending).unwrap();
    }
}
