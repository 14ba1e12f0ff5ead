//! Orchestration of the order lifecycle.
//!
//! ```text
//! create_sales_order ──► promote_to_production ──► start_production ──► advance_production*
//!                                                                          │ (100%)
//! issue_invoice ◄── record_delivery ◄── confirm_ready_for_delivery ◄───────┘
//! ```
//!
//! Every operation follows the same shape:
//!
//! 1. Look up the aggregates it touches (`NotFound` if any is missing).
//! 2. Check cross-aggregate rules (one production order per sales order, one
//!    delivery per production order, one invoice per sales order).
//! 3. Ask each aggregate to decide its events; identifiers for new
//!    aggregates are only peeked at this point.
//! 4. If and only if every decision succeeded: apply and journal the events,
//!    insert new aggregates, update the indexes and consume the identifiers.
//!
//! Step 4 cannot fail, so a rejected operation leaves no trace.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use fabflow_catalog::ProductCatalog;
use fabflow_core::{Aggregate, Clock, DomainError, DomainResult, IdSequence, SystemClock};
use fabflow_fulfillment::{
    Delivery, DeliveryCommand, DeliveryId, Invoice, InvoiceCommand, InvoiceId, IssueInvoice,
    ShipDelivery, TrackingCode, TrackingCodeGenerator, UuidTrackingCodes,
};
use fabflow_production::{
    AdvanceProduction, PlanProduction, ProductionOrder, ProductionOrderCommand, ProductionOrderId,
    ProductionStatus, StartProduction,
};
use fabflow_sales::{
    CreateSalesOrder, MarkDelivered, MarkInProduction, MarkReadyForDelivery, SalesOrder,
    SalesOrderCommand, SalesOrderId, SalesOrderStatus,
};

use crate::config::LifecycleConfig;
use crate::journal::{Journal, LifecycleBus, LifecycleEnvelope};

const SALES_ORDER: &str = "sales.order";
const PRODUCTION_ORDER: &str = "production.order";
const DELIVERY: &str = "fulfillment.delivery";
const INVOICE: &str = "fulfillment.invoice";

/// Candidate tracking codes drawn before giving up on finding an unused one.
pub const MAX_TRACKING_CODE_ATTEMPTS: usize = 16;

/// Owns all lifecycle state of a run.
///
/// Not internally synchronized; share it through
/// [`SharedLifecycleManager`](crate::SharedLifecycleManager).
pub struct OrderLifecycleManager {
    config: LifecycleConfig,
    catalog: ProductCatalog,
    clock: Box<dyn Clock>,
    tracking_codes: Box<dyn TrackingCodeGenerator>,

    pub(crate) sales_orders: BTreeMap<SalesOrderId, SalesOrder>,
    pub(crate) production_orders: BTreeMap<ProductionOrderId, ProductionOrder>,
    pub(crate) deliveries: BTreeMap<DeliveryId, Delivery>,
    pub(crate) invoices: BTreeMap<InvoiceId, Invoice>,

    pub(crate) production_by_sales_order: BTreeMap<SalesOrderId, ProductionOrderId>,
    pub(crate) delivery_by_production_order: BTreeMap<ProductionOrderId, DeliveryId>,
    issued_tracking_codes: HashSet<TrackingCode>,

    sales_order_ids: IdSequence<SalesOrderId>,
    production_order_ids: IdSequence<ProductionOrderId>,
    delivery_ids: IdSequence<DeliveryId>,

    journal: Journal,
}

impl core::fmt::Debug for OrderLifecycleManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderLifecycleManager")
            .field("config", &self.config)
            .field("sales_orders", &self.sales_orders.len())
            .field("production_orders", &self.production_orders.len())
            .field("deliveries", &self.deliveries.len())
            .field("invoices", &self.invoices.len())
            .field("journal", &self.journal.len())
            .finish_non_exhaustive()
    }
}

impl Default for OrderLifecycleManager {
    fn default() -> Self {
        Self::new(ProductCatalog::sample(), LifecycleConfig::default())
    }
}

impl OrderLifecycleManager {
    /// Manager with wall-clock time and random tracking codes.
    pub fn new(catalog: ProductCatalog, config: LifecycleConfig) -> Self {
        let tracking_codes = UuidTrackingCodes::new(config.tracking_prefix.clone());
        Self {
            config,
            catalog,
            clock: Box::new(SystemClock),
            tracking_codes: Box::new(tracking_codes),
            sales_orders: BTreeMap::new(),
            production_orders: BTreeMap::new(),
            deliveries: BTreeMap::new(),
            invoices: BTreeMap::new(),
            production_by_sales_order: BTreeMap::new(),
            delivery_by_production_order: BTreeMap::new(),
            issued_tracking_codes: HashSet::new(),
            sales_order_ids: IdSequence::new(),
            production_order_ids: IdSequence::new(),
            delivery_ids: IdSequence::new(),
            journal: Journal::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_tracking_codes(mut self, generator: impl TrackingCodeGenerator + 'static) -> Self {
        self.tracking_codes = Box::new(generator);
        self
    }

    /// Publish every committed envelope to `bus` as well.
    pub fn with_event_bus(mut self, bus: Arc<LifecycleBus>) -> Self {
        self.journal.attach_bus(bus);
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Committed events, in commit order.
    pub fn journal(&self) -> &[LifecycleEnvelope] {
        self.journal.entries()
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Record a new customer order for `quantity` units of `sku`.
    ///
    /// Price comes from the catalog; the order starts in `Created`.
    pub fn create_sales_order(
        &mut self,
        customer_name: &str,
        sku: &str,
        quantity: i64,
    ) -> DomainResult<SalesOrder> {
        self.try_create_sales_order(customer_name, sku, quantity)
            .map_err(|e| rejected("create_sales_order", e))
    }

    fn try_create_sales_order(
        &mut self,
        customer_name: &str,
        sku: &str,
        quantity: i64,
    ) -> DomainResult<SalesOrder> {
        let product = self.catalog.require(sku)?;
        let order_id = self.sales_order_ids.peek()?;

        let mut order = SalesOrder::empty(order_id);
        let events = order.handle(&SalesOrderCommand::CreateSalesOrder(CreateSalesOrder {
            order_id,
            customer_name: customer_name.to_string(),
            sku: product.sku().clone(),
            quantity,
            unit_price: product.unit_price(),
            occurred_at: self.clock.now(),
        }))?;

        self.journal.commit(SALES_ORDER, &mut order, events);
        self.sales_order_ids.commit(order_id);
        self.sales_orders.insert(order_id, order.clone());

        tracing::info!(
            sales_order_id = %order_id,
            customer = order.customer_name(),
            quantity = order.quantity(),
            total = %order.total(),
            "sales order created"
        );
        Ok(order)
    }

    /// Plan a production order for a `Created` sales order.
    pub fn promote_to_production(
        &mut self,
        sales_order_id: SalesOrderId,
    ) -> DomainResult<ProductionOrder> {
        self.try_promote_to_production(sales_order_id)
            .map_err(|e| rejected("promote_to_production", e))
    }

    fn try_promote_to_production(
        &mut self,
        sales_order_id: SalesOrderId,
    ) -> DomainResult<ProductionOrder> {
        let now = self.clock.now();
        let order = self
            .sales_orders
            .get(&sales_order_id)
            .ok_or_else(|| DomainError::not_found("sales order", sales_order_id))?;

        if let Some(existing) = self.production_by_sales_order.get(&sales_order_id) {
            return Err(DomainError::invalid_transition(format!(
                "sales order {sales_order_id} already has production order {existing}"
            )));
        }

        let order_events = order.handle(&SalesOrderCommand::MarkInProduction(MarkInProduction {
            order_id: sales_order_id,
            occurred_at: now,
        }))?;

        let sku = order.sku().cloned().ok_or_else(|| {
            DomainError::invalid_transition(format!("sales order {sales_order_id} has no product"))
        })?;
        let production_order_id = self.production_order_ids.peek()?;
        let mut production = ProductionOrder::empty(production_order_id);
        let production_events =
            production.handle(&ProductionOrderCommand::PlanProduction(PlanProduction {
                production_order_id,
                sales_order_id,
                sku,
                quantity: order.quantity(),
                occurred_at: now,
            }))?;

        // Commit.
        self.journal
            .commit(PRODUCTION_ORDER, &mut production, production_events);
        if let Some(order) = self.sales_orders.get_mut(&sales_order_id) {
            self.journal.commit(SALES_ORDER, order, order_events);
        }
        self.production_order_ids.commit(production_order_id);
        self.production_by_sales_order
            .insert(sales_order_id, production_order_id);
        self.production_orders
            .insert(production_order_id, production.clone());

        tracing::info!(
            sales_order_id = %sales_order_id,
            production_order_id = %production_order_id,
            "sales order promoted to production"
        );
        Ok(production)
    }

    /// Move a `Planned` production order to `In Progress`.
    pub fn start_production(
        &mut self,
        production_order_id: ProductionOrderId,
    ) -> DomainResult<ProductionOrder> {
        let command = ProductionOrderCommand::StartProduction(StartProduction {
            production_order_id,
            policy: self.config.progress,
            occurred_at: self.clock.now(),
        });
        self.execute_production(production_order_id, command)
            .map_err(|e| rejected("start_production", e))
    }

    /// Add one progress step to an `In Progress` production order; reaching
    /// 100% completes it.
    pub fn advance_production(
        &mut self,
        production_order_id: ProductionOrderId,
    ) -> DomainResult<ProductionOrder> {
        let command = ProductionOrderCommand::AdvanceProduction(AdvanceProduction {
            production_order_id,
            policy: self.config.progress,
            occurred_at: self.clock.now(),
        });
        self.execute_production(production_order_id, command)
            .map_err(|e| rejected("advance_production", e))
    }

    fn execute_production(
        &mut self,
        production_order_id: ProductionOrderId,
        command: ProductionOrderCommand,
    ) -> DomainResult<ProductionOrder> {
        let production = self
            .production_orders
            .get_mut(&production_order_id)
            .ok_or_else(|| DomainError::not_found("production order", production_order_id))?;

        let events = production.handle(&command)?;
        self.journal.commit(PRODUCTION_ORDER, production, events);

        let production = production.clone();
        match production.status() {
            ProductionStatus::Completed => tracing::info!(
                production_order_id = %production_order_id,
                "production completed"
            ),
            _ => tracing::info!(
                production_order_id = %production_order_id,
                completion = production.completion_percentage(),
                "production progressed"
            ),
        }
        Ok(production)
    }

    /// Confirm a completed production order; its sales order becomes
    /// `Ready for Delivery`.
    pub fn confirm_ready_for_delivery(
        &mut self,
        production_order_id: ProductionOrderId,
    ) -> DomainResult<SalesOrder> {
        self.try_confirm_ready_for_delivery(production_order_id)
            .map_err(|e| rejected("confirm_ready_for_delivery", e))
    }

    fn try_confirm_ready_for_delivery(
        &mut self,
        production_order_id: ProductionOrderId,
    ) -> DomainResult<SalesOrder> {
        let production = self
            .production_orders
            .get(&production_order_id)
            .ok_or_else(|| DomainError::not_found("production order", production_order_id))?;

        if !production.is_completed() {
            return Err(DomainError::invalid_transition(format!(
                "cannot confirm: production order {production_order_id} is {} (expected {})",
                production.status(),
                ProductionStatus::Completed
            )));
        }

        let sales_order_id = production.sales_order_id().ok_or_else(|| {
            DomainError::invalid_transition(format!(
                "production order {production_order_id} has no sales order"
            ))
        })?;

        let order = self
            .sales_orders
            .get_mut(&sales_order_id)
            .ok_or_else(|| DomainError::not_found("sales order", sales_order_id))?;
        let events = order.handle(&SalesOrderCommand::MarkReadyForDelivery(MarkReadyForDelivery {
            order_id: sales_order_id,
            occurred_at: self.clock.now(),
        }))?;

        self.journal.commit(SALES_ORDER, order, events);

        tracing::info!(
            sales_order_id = %sales_order_id,
            production_order_id = %production_order_id,
            "sales order ready for delivery"
        );
        Ok(order.clone())
    }

    /// Ship a `Ready for Delivery` sales order under a fresh tracking code.
    pub fn record_delivery(&mut self, sales_order_id: SalesOrderId) -> DomainResult<Delivery> {
        self.try_record_delivery(sales_order_id)
            .map_err(|e| rejected("record_delivery", e))
    }

    fn try_record_delivery(&mut self, sales_order_id: SalesOrderId) -> DomainResult<Delivery> {
        let now = self.clock.now();
        let order = self
            .sales_orders
            .get(&sales_order_id)
            .ok_or_else(|| DomainError::not_found("sales order", sales_order_id))?;

        let order_events = order.handle(&SalesOrderCommand::MarkDelivered(MarkDelivered {
            order_id: sales_order_id,
            occurred_at: now,
        }))?;

        let production_order_id = *self
            .production_by_sales_order
            .get(&sales_order_id)
            .ok_or_else(|| {
                DomainError::not_found("production order for sales order", sales_order_id)
            })?;
        let production = self
            .production_orders
            .get(&production_order_id)
            .ok_or_else(|| DomainError::not_found("production order", production_order_id))?;
        if !production.is_completed() {
            return Err(DomainError::invalid_transition(format!(
                "cannot deliver: production order {production_order_id} is {} (expected {})",
                production.status(),
                ProductionStatus::Completed
            )));
        }
        if let Some(existing) = self.delivery_by_production_order.get(&production_order_id) {
            return Err(DomainError::invalid_transition(format!(
                "production order {production_order_id} was already delivered as {existing}"
            )));
        }

        let delivery_id = self.delivery_ids.peek()?;
        let tracking_code = self.allocate_tracking_code()?;
        let mut delivery = Delivery::empty(delivery_id);
        let delivery_events = delivery.handle(&DeliveryCommand::ShipDelivery(ShipDelivery {
            delivery_id,
            production_order_id,
            sales_order_id,
            tracking_code: tracking_code.clone(),
            occurred_at: now,
        }))?;

        // Commit.
        self.journal.commit(DELIVERY, &mut delivery, delivery_events);
        if let Some(order) = self.sales_orders.get_mut(&sales_order_id) {
            self.journal.commit(SALES_ORDER, order, order_events);
        }
        self.delivery_ids.commit(delivery_id);
        self.issued_tracking_codes.insert(tracking_code.clone());
        self.delivery_by_production_order
            .insert(production_order_id, delivery_id);
        self.deliveries.insert(delivery_id, delivery.clone());

        tracing::info!(
            sales_order_id = %sales_order_id,
            delivery_id = %delivery_id,
            tracking_code = %tracking_code,
            "delivery recorded"
        );
        Ok(delivery)
    }

    /// Draw candidates until one has not been issued yet.
    fn allocate_tracking_code(&mut self) -> DomainResult<TrackingCode> {
        for attempt in 1..=MAX_TRACKING_CODE_ATTEMPTS {
            let candidate = self.tracking_codes.next_code()?;
            if !self.issued_tracking_codes.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(attempt, code = %candidate, "tracking code collision");
        }
        Err(DomainError::invalid_transition(format!(
            "no unused tracking code after {MAX_TRACKING_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Bill a delivered sales order for its total. One invoice per order.
    pub fn issue_invoice(&mut self, sales_order_id: SalesOrderId) -> DomainResult<Invoice> {
        self.try_issue_invoice(sales_order_id)
            .map_err(|e| rejected("issue_invoice", e))
    }

    fn try_issue_invoice(&mut self, sales_order_id: SalesOrderId) -> DomainResult<Invoice> {
        let order = self
            .sales_orders
            .get(&sales_order_id)
            .ok_or_else(|| DomainError::not_found("sales order", sales_order_id))?;

        if !order.is_delivered() {
            return Err(DomainError::invalid_transition(format!(
                "cannot invoice: sales order {sales_order_id} is {} (expected {})",
                order.status(),
                SalesOrderStatus::Delivered
            )));
        }

        let invoice_id = InvoiceId::for_order(sales_order_id);
        if self.invoices.contains_key(&invoice_id) {
            return Err(DomainError::invalid_transition(format!(
                "invoice {invoice_id} has already been issued"
            )));
        }

        let mut invoice = Invoice::empty(invoice_id);
        let events = invoice.handle(&InvoiceCommand::IssueInvoice(IssueInvoice {
            invoice_id,
            customer_name: order.customer_name().to_string(),
            amount: order.total(),
            occurred_at: self.clock.now(),
        }))?;

        self.journal.commit(INVOICE, &mut invoice, events);
        self.invoices.insert(invoice_id, invoice.clone());

        tracing::info!(
            invoice_id = %invoice_id,
            amount = %invoice.amount(),
            "invoice issued"
        );
        Ok(invoice)
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    pub fn sales_order(&self, id: SalesOrderId) -> DomainResult<&SalesOrder> {
        self.sales_orders
            .get(&id)
            .ok_or_else(|| DomainError::not_found("sales order", id))
    }

    pub fn production_order(&self, id: ProductionOrderId) -> DomainResult<&ProductionOrder> {
        self.production_orders
            .get(&id)
            .ok_or_else(|| DomainError::not_found("production order", id))
    }

    pub fn delivery(&self, id: DeliveryId) -> DomainResult<&Delivery> {
        self.deliveries
            .get(&id)
            .ok_or_else(|| DomainError::not_found("delivery", id))
    }

    pub fn invoice(&self, id: InvoiceId) -> DomainResult<&Invoice> {
        self.invoices
            .get(&id)
            .ok_or_else(|| DomainError::not_found("invoice", id))
    }

    pub fn production_for_sales_order(&self, id: SalesOrderId) -> Option<&ProductionOrder> {
        self.production_by_sales_order
            .get(&id)
            .and_then(|po| self.production_orders.get(po))
    }

    pub fn delivery_for_production_order(&self, id: ProductionOrderId) -> Option<&Delivery> {
        self.delivery_by_production_order
            .get(&id)
            .and_then(|d| self.deliveries.get(d))
    }

    /// Sales orders in creation order.
    pub fn sales_orders(&self) -> impl Iterator<Item = &SalesOrder> {
        self.sales_orders.values()
    }

    pub fn production_orders(&self) -> impl Iterator<Item = &ProductionOrder> {
        self.production_orders.values()
    }

    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.values()
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }
}

fn rejected(operation: &'static str, err: DomainError) -> DomainError {
    tracing::warn!(operation, kind = err.kind(), error = %err, "operation rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fabflow_core::FixedClock;
    use fabflow_fulfillment::{DeliveryStatus, SequentialTrackingCodes};
    use rust_decimal_macros::dec;

    fn manager() -> OrderLifecycleManager {
        OrderLifecycleManager::default()
            .with_clock(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()))
            .with_tracking_codes(SequentialTrackingCodes::new("TRK"))
    }

    fn completed(m: &mut OrderLifecycleManager) -> (SalesOrderId, ProductionOrderId) {
        let so = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();
        let po = m.promote_to_production(so).unwrap().id_typed();
        m.start_production(po).unwrap();
        for _ in 0..3 {
            m.advance_production(po).unwrap();
        }
        (so, po)
    }

    /// Always returns the same code.
    struct StuckCodes;

    impl TrackingCodeGenerator for StuckCodes {
        fn next_code(&mut self) -> DomainResult<TrackingCode> {
            TrackingCode::new("TRKSTUCK")
        }
    }

    /// Repeats its first code once, then counts up.
    struct OneCollision {
        calls: u32,
    }

    impl TrackingCodeGenerator for OneCollision {
        fn next_code(&mut self) -> DomainResult<TrackingCode> {
            self.calls += 1;
            let n = if self.calls <= 2 { 1 } else { self.calls - 1 };
            TrackingCode::new(format!("TRK{n:08}"))
        }
    }

    #[test]
    fn create_prices_from_catalog() {
        let mut m = manager();
        let order = m.create_sales_order("Acme", "PKG001", 3).unwrap();

        assert_eq!(order.id_typed().to_string(), "SO0001");
        assert_eq!(order.unit_price(), dec!(15.99));
        assert_eq!(order.total(), dec!(47.97));
        assert_eq!(order.status(), SalesOrderStatus::Created);
        assert_eq!(
            order.created_at(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejected_create_does_not_consume_an_id() {
        let mut m = manager();
        assert!(matches!(
            m.create_sales_order("Acme", "PKG001", 0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            m.create_sales_order("Acme", "NOPE", 1),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            m.create_sales_order("  ", "PKG001", 1),
            Err(DomainError::Validation(_))
        ));

        let order = m.create_sales_order("Acme", "PKG002", 1).unwrap();
        assert_eq!(order.id_typed().to_string(), "SO0001");
        assert_eq!(m.journal().len(), 1);
    }

    #[test]
    fn promote_links_orders_and_rejects_a_second_promotion() {
        let mut m = manager();
        let so = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();

        let po = m.promote_to_production(so).unwrap();
        assert_eq!(po.id_typed().to_string(), "PO0001");
        assert_eq!(po.sales_order_id(), Some(so));
        assert_eq!(po.quantity(), 3);
        assert_eq!(po.status(), ProductionStatus::Planned);
        assert_eq!(po.completion_percentage(), 0);
        assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::InProduction);

        let err = m.promote_to_production(so).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(m.production_orders().count(), 1);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut m = manager();
        assert!(matches!(
            m.promote_to_production(SalesOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            m.start_production(ProductionOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            m.advance_production(ProductionOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            m.confirm_ready_for_delivery(ProductionOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            m.record_delivery(SalesOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            m.issue_invoice(SalesOrderId::new(9)),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn production_progresses_in_policy_steps() {
        let mut m = manager();
        let so = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();
        let po = m.promote_to_production(so).unwrap().id_typed();

        assert!(matches!(
            m.advance_production(po),
            Err(DomainError::InvalidTransition(_))
        ));

        let started = m.start_production(po).unwrap();
        assert_eq!(started.status(), ProductionStatus::InProgress);
        assert_eq!(started.completion_percentage(), 25);

        assert!(matches!(
            m.start_production(po),
            Err(DomainError::InvalidTransition(_))
        ));

        assert_eq!(m.advance_production(po).unwrap().completion_percentage(), 50);
        assert_eq!(m.advance_production(po).unwrap().completion_percentage(), 75);
        let done = m.advance_production(po).unwrap();
        assert_eq!(done.status(), ProductionStatus::Completed);
        assert_eq!(done.completion_percentage(), 100);

        assert!(matches!(
            m.advance_production(po),
            Err(DomainError::InvalidTransition(_))
        ));
    }

    #[test]
    fn confirm_requires_completed_production() {
        let mut m = manager();
        let so = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();
        let po = m.promote_to_production(so).unwrap().id_typed();
        m.start_production(po).unwrap();

        assert!(matches!(
            m.confirm_ready_for_delivery(po),
            Err(DomainError::InvalidTransition(_))
        ));
        assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::InProduction);

        for _ in 0..3 {
            m.advance_production(po).unwrap();
        }
        let order = m.confirm_ready_for_delivery(po).unwrap();
        assert_eq!(order.status(), SalesOrderStatus::ReadyForDelivery);

        // Confirming twice is a transition error on the sales order.
        assert!(matches!(
            m.confirm_ready_for_delivery(po),
            Err(DomainError::InvalidTransition(_))
        ));
    }

    #[test]
    fn delivery_requires_ready_order_and_happens_once() {
        let mut m = manager();
        let (so, po) = completed(&mut m);

        assert!(matches!(
            m.record_delivery(so),
            Err(DomainError::InvalidTransition(_))
        ));

        m.confirm_ready_for_delivery(po).unwrap();
        let delivery = m.record_delivery(so).unwrap();
        assert_eq!(delivery.id_typed().to_string(), "DEL0001");
        assert_eq!(delivery.status(), DeliveryStatus::Shipped);
        assert_eq!(delivery.production_order_id(), Some(po));
        assert_eq!(delivery.tracking_code().unwrap().as_str(), "TRK00000001");
        assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::Delivered);
        assert_eq!(m.delivery_for_production_order(po), Some(&delivery));

        assert!(matches!(
            m.record_delivery(so),
            Err(DomainError::InvalidTransition(_))
        ));
        assert_eq!(m.deliveries().count(), 1);
    }

    #[test]
    fn tracking_code_collisions_are_retried() {
        let mut m = manager().with_tracking_codes(OneCollision { calls: 0 });

        let mut codes = Vec::new();
        for _ in 0..2 {
            let (so, po) = completed(&mut m);
            m.confirm_ready_for_delivery(po).unwrap();
            codes.push(m.record_delivery(so).unwrap().tracking_code().cloned().unwrap());
        }

        assert_eq!(codes[0].as_str(), "TRK00000001");
        assert_eq!(codes[1].as_str(), "TRK00000002");
    }

    #[test]
    fn exhausted_tracking_codes_reject_without_side_effects() {
        let mut m = manager().with_tracking_codes(StuckCodes);

        let (first_so, first_po) = completed(&mut m);
        m.confirm_ready_for_delivery(first_po).unwrap();
        m.record_delivery(first_so).unwrap();

        let (so, po) = completed(&mut m);
        m.confirm_ready_for_delivery(po).unwrap();
        let journal_len = m.journal().len();

        let err = m.record_delivery(so).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::ReadyForDelivery);
        assert_eq!(m.deliveries().count(), 1);
        assert_eq!(m.journal().len(), journal_len);
    }

    #[test]
    fn invoice_only_for_delivered_orders_and_only_once() {
        let mut m = manager();
        let (so, po) = completed(&mut m);

        assert!(matches!(
            m.issue_invoice(so),
            Err(DomainError::InvalidTransition(_))
        ));

        m.confirm_ready_for_delivery(po).unwrap();
        m.record_delivery(so).unwrap();

        let invoice = m.issue_invoice(so).unwrap();
        assert_eq!(invoice.id_typed().to_string(), "INV-SO0001");
        assert_eq!(invoice.amount(), dec!(47.97));
        assert_eq!(invoice.customer_name(), "Acme");

        assert!(matches!(
            m.issue_invoice(so),
            Err(DomainError::InvalidTransition(_))
        ));
    }

    #[test]
    fn journal_numbers_events_across_aggregates() {
        let mut m = manager();
        let (so, po) = completed(&mut m);
        m.confirm_ready_for_delivery(po).unwrap();
        m.record_delivery(so).unwrap();
        m.issue_invoice(so).unwrap();

        let types: Vec<&str> = m
            .journal()
            .iter()
            .map(|e| fabflow_events::Event::event_type(e.payload()))
            .collect();
        assert_eq!(
            types,
            vec![
                "sales.order.created",
                "production.order.planned",
                "sales.order.in_production",
                "production.order.started",
                "production.order.advanced",
                "production.order.advanced",
                "production.order.completed",
                "sales.order.ready_for_delivery",
                "fulfillment.delivery.shipped",
                "sales.order.delivered",
                "fulfillment.invoice.issued",
            ]
        );
        let sequence: Vec<u64> = m.journal().iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequence, (1..=11).collect::<Vec<u64>>());
    }
}
