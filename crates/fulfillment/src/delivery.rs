use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fabflow_core::{Aggregate, AggregateRoot, DomainError};
use fabflow_events::Event;
use fabflow_production::ProductionOrderId;
use fabflow_sales::SalesOrderId;

use crate::tracking::TrackingCode;

fabflow_core::sequential_id! {
    /// Delivery identifier (`DEL0001`, ...).
    pub struct DeliveryId => "DEL";
}

/// Delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Not yet recorded (only seen on an empty aggregate).
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Shipped")]
    Shipped,
}

impl core::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Shipped => "Shipped",
        })
    }
}

/// Aggregate root: Delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    id: DeliveryId,
    production_order_id: Option<ProductionOrderId>,
    sales_order_id: Option<SalesOrderId>,
    tracking_code: Option<TrackingCode>,
    delivered_at: Option<DateTime<Utc>>,
    status: DeliveryStatus,
    version: u64,
}

impl Delivery {
    pub fn empty(id: DeliveryId) -> Self {
        Self {
            id,
            production_order_id: None,
            sales_order_id: None,
            tracking_code: None,
            delivered_at: None,
            status: DeliveryStatus::Pending,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> DeliveryId {
        self.id
    }

    pub fn production_order_id(&self) -> Option<ProductionOrderId> {
        self.production_order_id
    }

    pub fn sales_order_id(&self) -> Option<SalesOrderId> {
        self.sales_order_id
    }

    pub fn tracking_code(&self) -> Option<&TrackingCode> {
        self.tracking_code.as_ref()
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn is_shipped(&self) -> bool {
        self.status == DeliveryStatus::Shipped
    }
}

impl AggregateRoot for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ShipDelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipDelivery {
    pub delivery_id: DeliveryId,
    pub production_order_id: ProductionOrderId,
    pub sales_order_id: SalesOrderId,
    pub tracking_code: TrackingCode,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryCommand {
    ShipDelivery(ShipDelivery),
}

/// Event: DeliveryShipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryShipped {
    pub delivery_id: DeliveryId,
    pub production_order_id: ProductionOrderId,
    pub sales_order_id: SalesOrderId,
    pub tracking_code: TrackingCode,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryEvent {
    DeliveryShipped(DeliveryShipped),
}

impl Event for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::DeliveryShipped(_) => "fulfillment.delivery.shipped",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DeliveryEvent::DeliveryShipped(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Delivery {
    type Command = DeliveryCommand;
    type Event = DeliveryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DeliveryEvent::DeliveryShipped(e) => {
                self.id = e.delivery_id;
                self.production_order_id = Some(e.production_order_id);
                self.sales_order_id = Some(e.sales_order_id);
                self.tracking_code = Some(e.tracking_code.clone());
                self.delivered_at = Some(e.occurred_at);
                self.status = DeliveryStatus::Shipped;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DeliveryCommand::ShipDelivery(cmd) => {
                if self.is_shipped() {
                    return Err(DomainError::invalid_transition(format!(
                        "delivery {} has already shipped",
                        self.id
                    )));
                }

                Ok(vec![DeliveryEvent::DeliveryShipped(DeliveryShipped {
                    delivery_id: cmd.delivery_id,
                    production_order_id: cmd.production_order_id,
                    sales_order_id: cmd.sales_order_id,
                    tracking_code: cmd.tracking_code.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabflow_events::execute;

    fn ship_cmd() -> DeliveryCommand {
        DeliveryCommand::ShipDelivery(ShipDelivery {
            delivery_id: DeliveryId::new(1),
            production_order_id: ProductionOrderId::new(4),
            sales_order_id: SalesOrderId::new(9),
            tracking_code: TrackingCode::new("TRKABCDEF12").unwrap(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn ship_records_links_and_tracking_code() {
        let mut delivery = Delivery::empty(DeliveryId::new(1));
        assert_eq!(delivery.status(), DeliveryStatus::Pending);

        let events = execute(&mut delivery, &ship_cmd()).unwrap();
        assert_eq!(events[0].event_type(), "fulfillment.delivery.shipped");

        assert_eq!(delivery.status(), DeliveryStatus::Shipped);
        assert_eq!(delivery.production_order_id(), Some(ProductionOrderId::new(4)));
        assert_eq!(delivery.sales_order_id(), Some(SalesOrderId::new(9)));
        assert_eq!(delivery.tracking_code().unwrap().as_str(), "TRKABCDEF12");
        assert_eq!(delivery.id_typed().to_string(), "DEL0001");
        assert_eq!(delivery.version(), 1);
    }

    #[test]
    fn cannot_ship_twice() {
        let mut delivery = Delivery::empty(DeliveryId::new(1));
        execute(&mut delivery, &ship_cmd()).unwrap();

        let err = delivery.handle(&ship_cmd()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }
}
