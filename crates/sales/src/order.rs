use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fabflow_catalog::Sku;
use fabflow_core::{Aggregate, AggregateRoot, DomainError};
use fabflow_events::Event;

fabflow_core::sequential_id! {
    /// Sales order identifier (`SO0001`, ...).
    pub struct SalesOrderId => "SO";
}

/// Sales order status lifecycle.
///
/// Strictly linear; the derived ordering is the lifecycle order, and a status
/// never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SalesOrderStatus {
    #[serde(rename = "Created")]
    Created,
    #[serde(rename = "In Production")]
    InProduction,
    #[serde(rename = "Ready for Delivery")]
    ReadyForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl SalesOrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            SalesOrderStatus::Created => "Created",
            SalesOrderStatus::InProduction => "In Production",
            SalesOrderStatus::ReadyForDelivery => "Ready for Delivery",
            SalesOrderStatus::Delivered => "Delivered",
        }
    }
}

impl core::fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    customer_name: String,
    sku: Option<Sku>,
    quantity: u32,
    unit_price: Decimal,
    total: Decimal,
    created_at: Option<DateTime<Utc>>,
    status: SalesOrderStatus,
    version: u64,
    created: bool,
}

impl SalesOrder {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            customer_name: String::new(),
            sku: None,
            quantity: 0,
            unit_price: Decimal::ZERO,
            total: Decimal::ZERO,
            created_at: None,
            status: SalesOrderStatus::Created,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Ordered product. `None` only before creation.
    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price captured when the order was created.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `quantity × unit_price`, fixed at creation.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_delivered(&self) -> bool {
        self.status == SalesOrderStatus::Delivered
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateSalesOrder.
///
/// `unit_price` is the catalog price at submission time; `quantity` is taken
/// as submitted and validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrder {
    pub order_id: SalesOrderId,
    pub customer_name: String,
    pub sku: Sku,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkInProduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInProduction {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkReadyForDelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadyForDelivery {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkDelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDelivered {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    CreateSalesOrder(CreateSalesOrder),
    MarkInProduction(MarkInProduction),
    MarkReadyForDelivery(MarkReadyForDelivery),
    MarkDelivered(MarkDelivered),
}

/// Event: SalesOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderCreated {
    pub order_id: SalesOrderId,
    pub customer_name: String,
    pub sku: Sku,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderInProduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInProduction {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderReadyForDelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReadyForDelivery {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDelivered {
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    SalesOrderCreated(SalesOrderCreated),
    OrderInProduction(OrderInProduction),
    OrderReadyForDelivery(OrderReadyForDelivery),
    OrderDelivered(OrderDelivered),
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::SalesOrderCreated(_) => "sales.order.created",
            SalesOrderEvent::OrderInProduction(_) => "sales.order.in_production",
            SalesOrderEvent::OrderReadyForDelivery(_) => "sales.order.ready_for_delivery",
            SalesOrderEvent::OrderDelivered(_) => "sales.order.delivered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.occurred_at,
            SalesOrderEvent::OrderInProduction(e) => e.occurred_at,
            SalesOrderEvent::OrderReadyForDelivery(e) => e.occurred_at,
            SalesOrderEvent::OrderDelivered(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SalesOrderEvent::SalesOrderCreated(e) => {
                self.id = e.order_id;
                self.customer_name = e.customer_name.clone();
                self.sku = Some(e.sku.clone());
                self.quantity = e.quantity;
                self.unit_price = e.unit_price;
                self.total = e.total;
                self.created_at = Some(e.occurred_at);
                self.status = SalesOrderStatus::Created;
                self.created = true;
            }
            SalesOrderEvent::OrderInProduction(_) => {
                self.status = SalesOrderStatus::InProduction;
            }
            SalesOrderEvent::OrderReadyForDelivery(_) => {
                self.status = SalesOrderStatus::ReadyForDelivery;
            }
            SalesOrderEvent::OrderDelivered(_) => {
                self.status = SalesOrderStatus::Delivered;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SalesOrderCommand::CreateSalesOrder(cmd) => self.handle_create(cmd),
            SalesOrderCommand::MarkInProduction(cmd) => {
                self.ensure_transition(cmd.order_id, SalesOrderStatus::Created, "start production")?;
                Ok(vec![SalesOrderEvent::OrderInProduction(OrderInProduction {
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::MarkReadyForDelivery(cmd) => {
                self.ensure_transition(
                    cmd.order_id,
                    SalesOrderStatus::InProduction,
                    "mark ready for delivery",
                )?;
                Ok(vec![SalesOrderEvent::OrderReadyForDelivery(OrderReadyForDelivery {
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            SalesOrderCommand::MarkDelivered(cmd) => {
                self.ensure_transition(
                    cmd.order_id,
                    SalesOrderStatus::ReadyForDelivery,
                    "mark delivered",
                )?;
                Ok(vec![SalesOrderEvent::OrderDelivered(OrderDelivered {
                    order_id: cmd.order_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl SalesOrder {
    fn ensure_transition(
        &self,
        order_id: SalesOrderId,
        required: SalesOrderStatus,
        action: &str,
    ) -> Result<(), DomainError> {
        if !self.created || self.id != order_id {
            return Err(DomainError::not_found("sales order", order_id));
        }
        if self.status != required {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action}: sales order {} is {} (expected {required})",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateSalesOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_transition(format!(
                "sales order {} already exists",
                self.id
            )));
        }

        let customer_name = cmd.customer_name.trim();
        if customer_name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let quantity = u32::try_from(cmd.quantity)
            .map_err(|_| DomainError::validation("quantity is too large"))?;

        if cmd.unit_price <= Decimal::ZERO {
            return Err(DomainError::validation("unit price must be positive"));
        }

        let total = cmd
            .unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| DomainError::validation("order total overflows"))?;

        Ok(vec![SalesOrderEvent::SalesOrderCreated(SalesOrderCreated {
            order_id: cmd.order_id,
            customer_name: customer_name.to_string(),
            sku: cmd.sku.clone(),
            quantity,
            unit_price: cmd.unit_price,
            total,
            occurred_at: cmd.occurred_at,
        })])
    }
}
