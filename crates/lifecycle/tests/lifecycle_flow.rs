use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fabflow_core::{DomainError, FixedClock};
use fabflow_events::{Event, EventBus};
use fabflow_fulfillment::{DeliveryStatus, SequentialTrackingCodes};
use fabflow_lifecycle::journal::LifecycleBus;
use fabflow_lifecycle::{LifecycleConfig, OrderLifecycleManager};
use fabflow_production::{ProductionOrderId, ProductionStatus, ProgressPolicy};
use fabflow_sales::{SalesOrderId, SalesOrderStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap()
}

fn manager() -> OrderLifecycleManager {
    OrderLifecycleManager::default()
        .with_clock(FixedClock(test_time()))
        .with_tracking_codes(SequentialTrackingCodes::new("TRK"))
}

#[test]
fn acme_order_goes_from_creation_to_invoice() {
    let mut m = manager();

    let order = m.create_sales_order("Acme", "PKG001", 3).unwrap();
    assert_eq!(order.total(), dec!(47.97));
    assert_eq!(order.status(), SalesOrderStatus::Created);
    let so = order.id_typed();

    let po = m.promote_to_production(so).unwrap().id_typed();
    assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::InProduction);

    let mut seen = vec![m.start_production(po).unwrap().completion_percentage()];
    while m.production_order(po).unwrap().status() != ProductionStatus::Completed {
        seen.push(m.advance_production(po).unwrap().completion_percentage());
    }
    assert_eq!(seen, vec![25, 50, 75, 100]);

    m.confirm_ready_for_delivery(po).unwrap();
    assert_eq!(
        m.sales_order(so).unwrap().status(),
        SalesOrderStatus::ReadyForDelivery
    );

    let delivery = m.record_delivery(so).unwrap();
    assert_eq!(delivery.status(), DeliveryStatus::Shipped);
    assert_eq!(delivery.delivered_at(), Some(test_time()));
    assert_eq!(m.sales_order(so).unwrap().status(), SalesOrderStatus::Delivered);
    assert_eq!(m.deliveries().count(), 1);

    let invoice = m.issue_invoice(so).unwrap();
    assert_eq!(invoice.amount(), dec!(47.97));

    assert_eq!(m.delivered_revenue(), dec!(47.97));
    assert!(m.active_production_orders().is_empty());
}

#[test]
fn promoting_an_order_in_production_changes_nothing() {
    let mut m = manager();
    let so = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();
    m.promote_to_production(so).unwrap();

    let report_before = m.tracking_report();
    let journal_before = m.journal().len();

    let err = m.promote_to_production(so).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
    assert_eq!(err.kind(), "invalid_transition");

    assert_eq!(m.tracking_report(), report_before);
    assert_eq!(m.journal().len(), journal_before);
    assert_eq!(m.production_orders().count(), 1);

    // The next production order still gets the next id.
    let other = m.create_sales_order("Globex", "PKG002", 1).unwrap().id_typed();
    assert_eq!(
        m.promote_to_production(other).unwrap().id_typed(),
        ProductionOrderId::new(2)
    );
}

#[test]
fn revenue_is_zero_without_deliveries() {
    let mut m = manager();
    m.create_sales_order("Acme", "PKG001", 3).unwrap();
    assert_eq!(m.delivered_revenue(), Decimal::ZERO);
    assert_eq!(m.average_delivered_order_value(), None);
}

#[test]
fn random_tracking_codes_are_unique_across_a_run() {
    let mut m = OrderLifecycleManager::default();
    let mut codes = HashSet::new();

    for i in 0..40 {
        let so = m
            .create_sales_order(&format!("Customer {i}"), "PKG003", 1)
            .unwrap()
            .id_typed();
        let po = m.promote_to_production(so).unwrap().id_typed();
        m.start_production(po).unwrap();
        while !m.production_order(po).unwrap().is_completed() {
            m.advance_production(po).unwrap();
        }
        m.confirm_ready_for_delivery(po).unwrap();
        let delivery = m.record_delivery(so).unwrap();
        let code = delivery.tracking_code().unwrap().as_str().to_string();
        assert!(code.starts_with("TRK"));
        assert_eq!(code.len(), 11);
        codes.insert(code);
    }

    assert_eq!(codes.len(), 40);
}

#[test]
fn progress_policy_comes_from_config() {
    let config = LifecycleConfig {
        progress: ProgressPolicy::new(40, 30).unwrap(),
        tracking_prefix: "SHIP".to_string(),
    };
    let mut m = OrderLifecycleManager::new(fabflow_catalog::ProductCatalog::sample(), config);

    let so = m.create_sales_order("Acme", "PKG005", 2).unwrap().id_typed();
    let po = m.promote_to_production(so).unwrap().id_typed();
    assert_eq!(m.start_production(po).unwrap().completion_percentage(), 40);
    assert_eq!(m.advance_production(po).unwrap().completion_percentage(), 70);
    let done = m.advance_production(po).unwrap();
    assert_eq!(done.completion_percentage(), 100);
    assert_eq!(done.status(), ProductionStatus::Completed);

    m.confirm_ready_for_delivery(po).unwrap();
    let delivery = m.record_delivery(so).unwrap();
    assert!(delivery.tracking_code().unwrap().as_str().starts_with("SHIP"));
}

#[test]
fn committed_events_are_published_in_journal_order() {
    let bus = Arc::new(LifecycleBus::new());
    let subscription = bus.subscribe();
    let mut m = manager().with_event_bus(Arc::clone(&bus));

    let so = m.create_sales_order("Acme", "PKG001", 1).unwrap().id_typed();
    m.promote_to_production(so).unwrap();
    let _ = m.promote_to_production(so);

    let received = subscription.drain();
    assert_eq!(received.as_slice(), m.journal());
    let types: Vec<_> = received.iter().map(|e| e.payload().event_type()).collect();
    assert_eq!(
        types,
        vec![
            "sales.order.created",
            "production.order.planned",
            "sales.order.in_production"
        ]
    );
}

#[derive(Debug, Clone)]
enum Op {
    Create { sku: usize, quantity: i64 },
    Promote(u32),
    Start(u32),
    Advance(u32),
    Confirm(u32),
    Deliver(u32),
    Invoice(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let id = 1u32..6;
    prop_oneof![
        (0usize..7, -1i64..5).prop_map(|(sku, quantity)| Op::Create { sku, quantity }),
        id.clone().prop_map(Op::Promote),
        id.clone().prop_map(Op::Start),
        id.clone().prop_map(Op::Advance),
        id.clone().prop_map(Op::Confirm),
        id.clone().prop_map(Op::Deliver),
        id.prop_map(Op::Invoice),
    ]
}

fn run(m: &mut OrderLifecycleManager, op: &Op) -> Result<(), DomainError> {
    const SKUS: [&str; 7] = ["PKG001", "PKG002", "PKG003", "PKG004", "PKG005", "PKG006", "NOPE"];
    match op {
        Op::Create { sku, quantity } => m.create_sales_order("Acme", SKUS[*sku], *quantity).map(drop),
        Op::Promote(n) => m.promote_to_production(SalesOrderId::new(*n)).map(drop),
        Op::Start(n) => m.start_production(ProductionOrderId::new(*n)).map(drop),
        Op::Advance(n) => m.advance_production(ProductionOrderId::new(*n)).map(drop),
        Op::Confirm(n) => m.confirm_ready_for_delivery(ProductionOrderId::new(*n)).map(drop),
        Op::Deliver(n) => m.record_delivery(SalesOrderId::new(*n)).map(drop),
        Op::Invoice(n) => m.issue_invoice(SalesOrderId::new(*n)).map(drop),
    }
}

fn assert_invariants(m: &OrderLifecycleManager) {
    for po in m.production_orders() {
        let c = po.completion_percentage();
        match po.status() {
            ProductionStatus::Planned => assert_eq!(c, 0),
            ProductionStatus::InProgress => assert!(c > 0 && c < 100),
            ProductionStatus::Completed => assert_eq!(c, 100),
        }
    }

    for order in m.sales_orders() {
        let production = m.production_for_sales_order(order.id_typed());
        assert_eq!(
            production.is_some(),
            order.status() != SalesOrderStatus::Created
        );
        if order.status() >= SalesOrderStatus::ReadyForDelivery {
            assert!(production.is_some_and(|po| po.is_completed()));
        }
        let delivered = production
            .and_then(|po| m.delivery_for_production_order(po.id_typed()))
            .is_some();
        assert_eq!(delivered, order.is_delivered());
        assert_eq!(order.total(), order.unit_price() * Decimal::from(order.quantity()));
    }

    assert!(m.production_orders().count() <= m.sales_orders().count());
    let codes: HashSet<_> = m.deliveries().filter_map(|d| d.tracking_code()).collect();
    assert_eq!(codes.len(), m.deliveries().count());
    assert!(m.invoices().all(|i| m.sales_order(i.sales_order_id()).is_ok_and(|o| o.is_delivered())));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Property: any sequence of operations keeps every lifecycle invariant,
    /// and a rejected operation leaves the manager untouched.
    #[test]
    fn random_operation_sequences_keep_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut m = manager();

        for op in &ops {
            let report_before = m.tracking_report();
            let journal_before = m.journal().len();

            if run(&mut m, op).is_err() {
                prop_assert_eq!(m.tracking_report(), report_before);
                prop_assert_eq!(m.journal().len(), journal_before);
            } else {
                prop_assert!(m.journal().len() > journal_before);
            }
            assert_invariants(&m);
        }
    }
}
