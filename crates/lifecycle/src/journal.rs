//! Append-only record of every committed lifecycle event.
//!
//! Envelopes are numbered across the whole run, so events of different
//! aggregates interleave in the order they were committed. When a bus is
//! attached, each envelope is also published to it after being appended.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fabflow_core::{Aggregate, AggregateRoot};
use fabflow_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
use fabflow_fulfillment::{DeliveryEvent, InvoiceEvent};
use fabflow_production::ProductionOrderEvent;
use fabflow_sales::SalesOrderEvent;

/// Any event produced by a lifecycle aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    SalesOrder(SalesOrderEvent),
    ProductionOrder(ProductionOrderEvent),
    Delivery(DeliveryEvent),
    Invoice(InvoiceEvent),
}

impl Event for LifecycleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::SalesOrder(e) => e.event_type(),
            LifecycleEvent::ProductionOrder(e) => e.event_type(),
            LifecycleEvent::Delivery(e) => e.event_type(),
            LifecycleEvent::Invoice(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            LifecycleEvent::SalesOrder(e) => e.version(),
            LifecycleEvent::ProductionOrder(e) => e.version(),
            LifecycleEvent::Delivery(e) => e.version(),
            LifecycleEvent::Invoice(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LifecycleEvent::SalesOrder(e) => e.occurred_at(),
            LifecycleEvent::ProductionOrder(e) => e.occurred_at(),
            LifecycleEvent::Delivery(e) => e.occurred_at(),
            LifecycleEvent::Invoice(e) => e.occurred_at(),
        }
    }
}

impl From<SalesOrderEvent> for LifecycleEvent {
    fn from(value: SalesOrderEvent) -> Self {
        LifecycleEvent::SalesOrder(value)
    }
}

impl From<ProductionOrderEvent> for LifecycleEvent {
    fn from(value: ProductionOrderEvent) -> Self {
        LifecycleEvent::ProductionOrder(value)
    }
}

impl From<DeliveryEvent> for LifecycleEvent {
    fn from(value: DeliveryEvent) -> Self {
        LifecycleEvent::Delivery(value)
    }
}

impl From<InvoiceEvent> for LifecycleEvent {
    fn from(value: InvoiceEvent) -> Self {
        LifecycleEvent::Invoice(value)
    }
}

pub type LifecycleEnvelope = EventEnvelope<LifecycleEvent>;

/// Bus that committed lifecycle envelopes are published to.
pub type LifecycleBus = InMemoryEventBus<LifecycleEnvelope>;

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<LifecycleEnvelope>,
    bus: Option<Arc<LifecycleBus>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_bus(&mut self, bus: Arc<LifecycleBus>) {
        self.bus = Some(bus);
    }

    pub fn entries(&self) -> &[LifecycleEnvelope] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply decided `events` to `aggregate` and record each one.
    ///
    /// Only call this once every aggregate touched by an operation has
    /// accepted its command.
    pub fn commit<A>(&mut self, aggregate_type: &'static str, aggregate: &mut A, events: Vec<A::Event>)
    where
        A: Aggregate,
        A::Id: core::fmt::Display,
        A::Event: Into<LifecycleEvent>,
    {
        for event in events {
            aggregate.apply(&event);
            self.append(aggregate.id().to_string(), aggregate_type, event.into());
        }
    }

    fn append(&mut self, aggregate_id: String, aggregate_type: &'static str, event: LifecycleEvent) {
        let sequence_number = self.entries.len() as u64 + 1;
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            aggregate_id,
            aggregate_type,
            sequence_number,
            event,
        );

        tracing::debug!(
            sequence_number,
            aggregate_id = envelope.aggregate_id(),
            event_type = envelope.payload().event_type(),
            "event recorded"
        );

        if let Some(bus) = &self.bus {
            // Already committed; a failed publish is reported, never undone.
            if let Err(err) = bus.publish(envelope.clone()) {
                tracing::warn!(
                    sequence_number,
                    error = %err,
                    "failed to publish lifecycle event"
                );
            }
        }

        self.entries.push(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabflow_catalog::Sku;
    use fabflow_core::{Clock, FixedClock};
    use fabflow_sales::{CreateSalesOrder, SalesOrder, SalesOrderCommand, SalesOrderId};
    use rust_decimal_macros::dec;

    fn created_order() -> (SalesOrder, Vec<SalesOrderEvent>) {
        let order = SalesOrder::empty(SalesOrderId::new(1));
        let events = order
            .handle(&SalesOrderCommand::CreateSalesOrder(CreateSalesOrder {
                order_id: SalesOrderId::new(1),
                customer_name: "Acme".to_string(),
                sku: Sku::new("PKG001").unwrap(),
                quantity: 3,
                unit_price: dec!(15.99),
                occurred_at: FixedClock(Utc::now()).now(),
            }))
            .unwrap();
        (order, events)
    }

    #[test]
    fn commit_applies_and_numbers_events() {
        let mut journal = Journal::new();
        let (mut order, events) = created_order();

        journal.commit("sales.order", &mut order, events);

        assert!(order.is_created());
        assert_eq!(journal.len(), 1);
        let entry = &journal.entries()[0];
        assert_eq!(entry.sequence_number(), 1);
        assert_eq!(entry.aggregate_id(), "SO0001");
        assert_eq!(entry.aggregate_type(), "sales.order");
        assert_eq!(entry.payload().event_type(), "sales.order.created");
    }

    #[test]
    fn committed_events_reach_the_bus() {
        let bus = Arc::new(LifecycleBus::new());
        let subscription = bus.subscribe();

        let mut journal = Journal::new();
        journal.attach_bus(bus);
        let (mut order, events) = created_order();
        journal.commit("sales.order", &mut order, events);

        let received = subscription.drain();
        assert_eq!(received, journal.entries().to_vec());
    }

    #[test]
    fn serializes_with_aggregate_tag() {
        let (_, mut events) = created_order();
        let event = LifecycleEvent::from(events.remove(0));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["aggregate"], "sales_order");

        let back: LifecycleEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
