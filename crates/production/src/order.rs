use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fabflow_catalog::Sku;
use fabflow_core::{Aggregate, AggregateRoot, DomainError};
use fabflow_events::Event;
use fabflow_sales::SalesOrderId;

use crate::progress::{Completion, ProgressPolicy};

fabflow_core::sequential_id! {
    /// Production order identifier (`PO0001`, ...).
    pub struct ProductionOrderId => "PO";
}

/// Production order status lifecycle: `Planned → In Progress → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductionStatus {
    #[serde(rename = "Planned")]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl ProductionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProductionStatus::Planned => "Planned",
            ProductionStatus::InProgress => "In Progress",
            ProductionStatus::Completed => "Completed",
        }
    }
}

impl core::fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status and completion as one value: 0% while planned, strictly between 0
/// and 100 while in progress, 100% exactly when completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Planned,
    InProgress(Completion),
    Completed,
}

impl Stage {
    fn at(completion: Completion) -> Self {
        if completion.is_full() {
            Stage::Completed
        } else if completion == Completion::NONE {
            Stage::Planned
        } else {
            Stage::InProgress(completion)
        }
    }

    fn status(self) -> ProductionStatus {
        match self {
            Stage::Planned => ProductionStatus::Planned,
            Stage::InProgress(_) => ProductionStatus::InProgress,
            Stage::Completed => ProductionStatus::Completed,
        }
    }

    fn completion(self) -> Completion {
        match self {
            Stage::Planned => Completion::NONE,
            Stage::InProgress(c) => c,
            Stage::Completed => Completion::FULL,
        }
    }
}

/// Aggregate root: ProductionOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionOrder {
    id: ProductionOrderId,
    sales_order_id: Option<SalesOrderId>,
    sku: Option<Sku>,
    quantity: u32,
    planned_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    stage: Stage,
    version: u64,
    created: bool,
}

impl ProductionOrder {
    /// Create an empty, not-yet-planned aggregate instance.
    pub fn empty(id: ProductionOrderId) -> Self {
        Self {
            id,
            sales_order_id: None,
            sku: None,
            quantity: 0,
            planned_at: None,
            started_at: None,
            completed_at: None,
            stage: Stage::Planned,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductionOrderId {
        self.id
    }

    /// The sales order this work order fulfils. `None` only before planning.
    pub fn sales_order_id(&self) -> Option<SalesOrderId> {
        self.sales_order_id
    }

    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    /// Quantity copied from the sales order at planning time.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn planned_at(&self) -> Option<DateTime<Utc>> {
        self.planned_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn status(&self) -> ProductionStatus {
        self.stage.status()
    }

    pub fn completion(&self) -> Completion {
        self.stage.completion()
    }

    pub fn completion_percentage(&self) -> u8 {
        self.stage.completion().percent()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_completed(&self) -> bool {
        self.stage == Stage::Completed
    }
}

impl AggregateRoot for ProductionOrder {
    type Id = ProductionOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlanProduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProduction {
    pub production_order_id: ProductionOrderId,
    pub sales_order_id: SalesOrderId,
    pub sku: Sku,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartProduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProduction {
    pub production_order_id: ProductionOrderId,
    pub policy: ProgressPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdvanceProduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceProduction {
    pub production_order_id: ProductionOrderId,
    pub policy: ProgressPolicy,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionOrderCommand {
    PlanProduction(PlanProduction),
    StartProduction(StartProduction),
    AdvanceProduction(AdvanceProduction),
}

/// Event: ProductionPlanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlanned {
    pub production_order_id: ProductionOrderId,
    pub sales_order_id: SalesOrderId,
    pub sku: Sku,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductionStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionStarted {
    pub production_order_id: ProductionOrderId,
    pub completion: Completion,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductionAdvanced (still short of 100%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionAdvanced {
    pub production_order_id: ProductionOrderId,
    pub completion: Completion,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductionCompleted (an advance that reached 100%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompleted {
    pub production_order_id: ProductionOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionOrderEvent {
    ProductionPlanned(ProductionPlanned),
    ProductionStarted(ProductionStarted),
    ProductionAdvanced(ProductionAdvanced),
    ProductionCompleted(ProductionCompleted),
}

impl Event for ProductionOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductionOrderEvent::ProductionPlanned(_) => "production.order.planned",
            ProductionOrderEvent::ProductionStarted(_) => "production.order.started",
            ProductionOrderEvent::ProductionAdvanced(_) => "production.order.advanced",
            ProductionOrderEvent::ProductionCompleted(_) => "production.order.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductionOrderEvent::ProductionPlanned(e) => e.occurred_at,
            ProductionOrderEvent::ProductionStarted(e) => e.occurred_at,
            ProductionOrderEvent::ProductionAdvanced(e) => e.occurred_at,
            ProductionOrderEvent::ProductionCompleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProductionOrder {
    type Command = ProductionOrderCommand;
    type Event = ProductionOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductionOrderEvent::ProductionPlanned(e) => {
                self.id = e.production_order_id;
                self.sales_order_id = Some(e.sales_order_id);
                self.sku = Some(e.sku.clone());
                self.quantity = e.quantity;
                self.planned_at = Some(e.occurred_at);
                self.stage = Stage::Planned;
                self.created = true;
            }
            ProductionOrderEvent::ProductionStarted(e) => {
                self.started_at = Some(e.occurred_at);
                self.stage = Stage::at(e.completion);
            }
            ProductionOrderEvent::ProductionAdvanced(e) => {
                self.stage = Stage::at(e.completion);
            }
            ProductionOrderEvent::ProductionCompleted(e) => {
                self.completed_at = Some(e.occurred_at);
                self.stage = Stage::Completed;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductionOrderCommand::PlanProduction(cmd) => self.handle_plan(cmd),
            ProductionOrderCommand::StartProduction(cmd) => self.handle_start(cmd),
            ProductionOrderCommand::AdvanceProduction(cmd) => self.handle_advance(cmd),
        }
    }
}

impl ProductionOrder {
    fn ensure_status(
        &self,
        production_order_id: ProductionOrderId,
        required: ProductionStatus,
        action: &str,
    ) -> Result<(), DomainError> {
        if !self.created || self.id != production_order_id {
            return Err(DomainError::not_found("production order", production_order_id));
        }
        if self.status() != required {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action}: production order {} is {} (expected {required})",
                self.id,
                self.status()
            )));
        }
        Ok(())
    }

    fn handle_plan(&self, cmd: &PlanProduction) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_transition(format!(
                "production order {} already exists",
                self.id
            )));
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("production quantity must be positive"));
        }

        Ok(vec![ProductionOrderEvent::ProductionPlanned(ProductionPlanned {
            production_order_id: cmd.production_order_id,
            sales_order_id: cmd.sales_order_id,
            sku: cmd.sku.clone(),
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start(&self, cmd: &StartProduction) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        self.ensure_status(cmd.production_order_id, ProductionStatus::Planned, "start production")?;

        Ok(vec![ProductionOrderEvent::ProductionStarted(ProductionStarted {
            production_order_id: cmd.production_order_id,
            completion: cmd.policy.started(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_advance(
        &self,
        cmd: &AdvanceProduction,
    ) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        self.ensure_status(
            cmd.production_order_id,
            ProductionStatus::InProgress,
            "advance production",
        )?;

        let next = cmd.policy.advanced(self.completion());
        let event = if next.is_full() {
            ProductionOrderEvent::ProductionCompleted(ProductionCompleted {
                production_order_id: cmd.production_order_id,
                occurred_at: cmd.occurred_at,
            })
        } else {
            ProductionOrderEvent::ProductionAdvanced(ProductionAdvanced {
                production_order_id: cmd.production_order_id,
                completion: next,
                occurred_at: cmd.occurred_at,
            })
        };

        Ok(vec![event])
    }
}
