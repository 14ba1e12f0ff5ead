//! The order lifecycle manager.
//!
//! Owns every sales order, production order, delivery and invoice of a run and
//! is the only way to move them between states:
//!
//! ```text
//! SalesOrder:      Created → In Production → Ready for Delivery → Delivered
//! ProductionOrder: Planned → In Progress → Completed
//! ```
//!
//! Each operation decides the events of every aggregate it touches first and
//! applies them only if all decisions succeeded, so a rejected operation
//! leaves the manager exactly as it was.

pub mod config;
pub mod journal;
pub mod manager;
pub mod queries;
pub mod report;
pub mod shared;

pub use config::{ConfigError, LifecycleConfig};
pub use journal::{Journal, LifecycleBus, LifecycleEnvelope, LifecycleEvent};
pub use manager::OrderLifecycleManager;
pub use queries::{CompletionStage, LifecycleSummary};
pub use report::{OrderTrackingRow, ReportError, TRACKING_CSV_HEADER, export_csv};
pub use shared::SharedLifecycleManager;
