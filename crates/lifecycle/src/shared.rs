use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fabflow_core::DomainResult;
use fabflow_fulfillment::{Delivery, Invoice};
use fabflow_production::{ProductionOrder, ProductionOrderId};
use fabflow_sales::{SalesOrder, SalesOrderId};

use crate::manager::OrderLifecycleManager;

/// Cloneable handle to one manager behind a single mutex.
///
/// Each operation runs entirely under the lock, so operations on the same
/// orders are serialized.
#[derive(Debug, Clone)]
pub struct SharedLifecycleManager {
    inner: Arc<Mutex<OrderLifecycleManager>>,
}

impl SharedLifecycleManager {
    pub fn new(manager: OrderLifecycleManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    // A panic while holding the lock cannot leave a half-applied transition,
    // so a poisoned lock is taken over as is.
    fn lock(&self) -> MutexGuard<'_, OrderLifecycleManager> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access (queries, reports, several operations
    /// that must not interleave with others).
    pub fn with<R>(&self, f: impl FnOnce(&mut OrderLifecycleManager) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn create_sales_order(
        &self,
        customer_name: &str,
        sku: &str,
        quantity: i64,
    ) -> DomainResult<SalesOrder> {
        self.lock().create_sales_order(customer_name, sku, quantity)
    }

    pub fn promote_to_production(&self, id: SalesOrderId) -> DomainResult<ProductionOrder> {
        self.lock().promote_to_production(id)
    }

    pub fn start_production(&self, id: ProductionOrderId) -> DomainResult<ProductionOrder> {
        self.lock().start_production(id)
    }

    pub fn advance_production(&self, id: ProductionOrderId) -> DomainResult<ProductionOrder> {
        self.lock().advance_production(id)
    }

    pub fn confirm_ready_for_delivery(&self, id: ProductionOrderId) -> DomainResult<SalesOrder> {
        self.lock().confirm_ready_for_delivery(id)
    }

    pub fn record_delivery(&self, id: SalesOrderId) -> DomainResult<Delivery> {
        self.lock().record_delivery(id)
    }

    pub fn issue_invoice(&self, id: SalesOrderId) -> DomainResult<Invoice> {
        self.lock().issue_invoice(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_promotions_create_one_production_order() {
        let shared = SharedLifecycleManager::new(OrderLifecycleManager::default());
        let so = shared.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.promote_to_production(so).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(shared.with(|m| m.production_orders().count()), 1);
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let shared = SharedLifecycleManager::new(OrderLifecycleManager::default());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            shared
                                .create_sales_order(&format!("Customer {i}"), "PKG002", 1)
                                .unwrap()
                                .id_typed()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<SalesOrderId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 100);
        assert_eq!(ids.last().map(|id| id.value()), Some(100));
    }

    #[test]
    fn lock_survives_a_panicking_reader() {
        let shared = SharedLifecycleManager::new(OrderLifecycleManager::default());
        let clone = shared.clone();
        let _ = thread::spawn(move || {
            clone.with(|_| panic!("reader failed"));
        })
        .join();

        assert!(shared.create_sales_order("Acme", "PKG001", 1).is_ok());
    }
}
