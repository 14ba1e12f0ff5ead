//! Production orders (event-driven).
//!
//! The work order created to fulfil one sales order, with its progress
//! tracking. Pure domain logic; no IO.

pub mod order;
pub mod progress;

pub use order::{
    AdvanceProduction, PlanProduction, ProductionAdvanced, ProductionCompleted, ProductionOrder,
    ProductionOrderCommand, ProductionOrderEvent, ProductionOrderId, ProductionPlanned,
    ProductionStarted, ProductionStatus, StartProduction,
};
pub use progress::{Completion, ProgressPolicy};
