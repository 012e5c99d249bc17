//! Optimistic list mutation with rollback.
//!
//! Used by the admin product list: a delete or restore is applied to the
//! displayed list immediately, the backend call runs, and on failure the
//! list is put back exactly as it was. Only one action may be in flight at
//! a time; a second action (including a double click on the same row) is
//! refused until the first one settles.
//!
//! ```
//! use minimoda_core::optimistic::{Keyed, OptimisticList};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Row { id: u32, label: &'static str }
//!
//! impl Keyed for Row {
//!     type Key = u32;
//!     fn key(&self) -> &u32 { &self.id }
//! }
//!
//! let mut list = OptimisticList::new(vec![Row { id: 1, label: "a" }, Row { id: 2, label: "b" }]);
//! let before = list.items().to_vec();
//!
//! let pending = list.begin(&1, |rows| rows.retain(|r| r.id != 1)).unwrap();
//! assert_eq!(list.items().len(), 1);
//! assert!(list.begin(&2, |_| {}).is_err());
//!
//! // the backend call failed
//! list.rollback(pending).unwrap();
//! assert_eq!(list.items(), before.as_slice());
//! ```

use std::fmt::Debug;

use crate::product::Product;
use crate::types::ProductId;

/// Items that can be identified within a list.
pub trait Keyed {
    type Key: Clone + PartialEq + Debug + Send;

    fn key(&self) -> &Self::Key;
}

impl Keyed for Product {
    type Key = ProductId;

    fn key(&self) -> &ProductId {
        &self.id
    }
}

/// Errors from optimistic list operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimisticError {
    /// Another action has not settled yet.
    #[error("another action is in progress for {pending}")]
    ActionInFlight { pending: String },
    /// The target item is not in the displayed list.
    #[error("{0} is not in the list")]
    NotInList(String),
    /// The token does not belong to the action currently in flight.
    #[error("action token does not match the action in flight")]
    StaleToken,
}

/// Token for an action that has been applied optimistically.
///
/// Must be handed back to [`OptimisticList::commit`] or
/// [`OptimisticList::rollback`].
#[derive(Debug)]
#[must_use = "an optimistic action must be committed or rolled back"]
pub struct PendingAction<K> {
    key: K,
    sequence: u64,
}

impl<K> PendingAction<K> {
    pub const fn key(&self) -> &K {
        &self.key
    }
}

#[derive(Debug, Clone)]
struct InFlight<T: Keyed> {
    key: T::Key,
    sequence: u64,
    snapshot: Vec<T>,
}

/// A displayed list with a single in-flight action guard.
#[derive(Debug, Clone)]
pub struct OptimisticList<T: Keyed> {
    items: Vec<T>,
    in_flight: Option<InFlight<T>>,
    sequence: u64,
}

impl<T: Keyed> Default for OptimisticList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Keyed> OptimisticList<T> {
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self {
            items,
            in_flight: None,
            sequence: 0,
        }
    }

    /// Items as currently displayed.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Key of the action in flight, if any.
    #[must_use]
    pub fn pending_key(&self) -> Option<&T::Key> {
        self.in_flight.as_ref().map(|f| &f.key)
    }

    /// Replace the displayed items with a fresh listing.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Swap in a newer version of a displayed item.
    ///
    /// Returns `false` if no item with the same key is displayed. The
    /// in-flight guard and its snapshot are left alone.
    pub fn replace_item(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|slot| slot.key() == item.key()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }
}

impl<T: Keyed + Clone> OptimisticList<T> {
    /// Snapshot the list and apply `mutate` to it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`OptimisticError::ActionInFlight`] if another action has not
    /// settled, or [`OptimisticError::NotInList`] if `key` is not displayed.
    pub fn begin(
        &mut self,
        key: &T::Key,
        mutate: impl FnOnce(&mut Vec<T>),
    ) -> Result<PendingAction<T::Key>, OptimisticError> {
        if let Some(in_flight) = &self.in_flight {
            return Err(OptimisticError::ActionInFlight {
                pending: format!("{:?}", in_flight.key),
            });
        }
        if !self.items.iter().any(|item| item.key() == key) {
            return Err(OptimisticError::NotInList(format!("{key:?}")));
        }

        self.sequence += 1;
        self.in_flight = Some(InFlight {
            key: key.clone(),
            sequence: self.sequence,
            snapshot: self.items.clone(),
        });
        mutate(&mut self.items);

        Ok(PendingAction {
            key: key.clone(),
            sequence: self.sequence,
        })
    }

    /// Settle an action that the backend accepted.
    ///
    /// When the backend returned the updated item and it is still displayed,
    /// it replaces the optimistic version.
    ///
    /// # Errors
    ///
    /// Returns [`OptimisticError::StaleToken`] if `pending` is not the action in flight.
    pub fn commit(
        &mut self,
        pending: PendingAction<T::Key>,
        confirmed: Option<T>,
    ) -> Result<(), OptimisticError> {
        self.settle(&pending)?;
        if let Some(confirmed) = confirmed
            && let Some(slot) = self
                .items
                .iter_mut()
                .find(|item| item.key() == confirmed.key())
        {
            *slot = confirmed;
        }
        Ok(())
    }

    /// Undo an action that the backend rejected, restoring the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`OptimisticError::StaleToken`] if `pending` is not the action in flight.
    pub fn rollback(&mut self, pending: PendingAction<T::Key>) -> Result<(), OptimisticError> {
        let in_flight = self.settle(&pending)?;
        self.items = in_flight.snapshot;
        Ok(())
    }

    fn settle(&mut self, pending: &PendingAction<T::Key>) -> Result<InFlight<T>, OptimisticError> {
        match self.in_flight.take() {
            Some(in_flight) if in_flight.sequence == pending.sequence => Ok(in_flight),
            other => {
                self.in_flight = other;
                Err(OptimisticError::StaleToken)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::product::Variant;
    use crate::types::{Genre, Price, ProductStatus, Size};

    fn product(id: &str, status: ProductStatus) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            description: String::new(),
            genre: Genre::Unisex,
            status,
            image: None,
            variants: vec![Variant::new(Size::M9, 1, Price::ZERO)],
            created_at: None,
        }
    }

    fn list() -> OptimisticList<Product> {
        OptimisticList::new(vec![
            product("1", ProductStatus::Available),
            product("2", ProductStatus::SoldOut),
        ])
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut list = list();
        let before = list.items().to_vec();
        let id = ProductId::new("1");

        let pending = list
            .begin(&id, |items| items.retain(|p| p.id != id))
            .unwrap();
        assert_eq!(list.items().len(), 1);

        list.rollback(pending).unwrap();
        assert_eq!(list.items(), before.as_slice());
        assert!(list.pending_key().is_none());
    }

    #[test]
    fn test_commit_keeps_optimistic_state_and_applies_confirmation() {
        let mut list = list();
        let id = ProductId::new("2");

        let pending = list
            .begin(&id, |items| {
                for p in items.iter_mut().filter(|p| p.id == id) {
                    p.status = ProductStatus::Deleted;
                }
            })
            .unwrap();

        let mut confirmed = product("2", ProductStatus::Deleted);
        confirmed.name = "Renamed by backend".to_string();
        list.commit(pending, Some(confirmed)).unwrap();

        let row = list.items().iter().find(|p| p.id == id).unwrap();
        assert_eq!(row.status, ProductStatus::Deleted);
        assert_eq!(row.name, "Renamed by backend");
    }

    #[test]
    fn test_single_action_guard() {
        let mut list = list();
        let first = ProductId::new("1");
        let second = ProductId::new("2");

        let pending = list.begin(&first, |_| {}).unwrap();
        assert!(matches!(
            list.begin(&first, |_| {}),
            Err(OptimisticError::ActionInFlight { .. })
        ));
        assert!(matches!(
            list.begin(&second, |_| {}),
            Err(OptimisticError::ActionInFlight { .. })
        ));

        list.commit(pending, None).unwrap();
        let again = list.begin(&second, |_| {}).unwrap();
        list.commit(again, None).unwrap();
    }

    #[test]
    fn test_replace_item_only_touches_displayed_rows() {
        let mut list = list();
        let mut renamed = product("1", ProductStatus::Available);
        renamed.name = "Body rayado".to_string();

        assert!(list.replace_item(renamed));
        assert_eq!(list.items()[0].name, "Body rayado");
        assert!(!list.replace_item(product("9", ProductStatus::Available)));
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut list = list();
        assert!(matches!(
            list.begin(&ProductId::new("nope"), |_| {}),
            Err(OptimisticError::NotInList(_))
        ));
        assert!(list.pending_key().is_none());
    }

    #[test]
    fn test_stale_token_rejected() {
        let mut list = list();
        let id = ProductId::new("1");
        let pending = list.begin(&id, |_| {}).unwrap();
        list.commit(pending, None).unwrap();

        let current = list.begin(&id, |_| {}).unwrap();
        let forged = PendingAction {
            key: id.clone(),
            sequence: 0,
        };
        assert_eq!(list.rollback(forged), Err(OptimisticError::StaleToken));
        assert_eq!(list.pending_key(), Some(&id));
        list.commit(current, None).unwrap();
    }
}
