//! Operation scripts: a JSON array of tagged steps run against one manager.
//!
//! ```json
//! [
//!   {"op": "create_sales_order", "customer": "Acme", "sku": "PKG001", "quantity": 3},
//!   {"op": "promote_to_production", "sales_order": "SO0001"},
//!   {"op": "start_production", "production_order": "PO0001"}
//! ]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fabflow_core::DomainError;
use fabflow_lifecycle::OrderLifecycleManager;
use fabflow_production::ProductionOrderId;
use fabflow_sales::SalesOrderId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    CreateSalesOrder {
        customer: String,
        sku: String,
        quantity: i64,
    },
    PromoteToProduction {
        sales_order: SalesOrderId,
    },
    StartProduction {
        production_order: ProductionOrderId,
    },
    AdvanceProduction {
        production_order: ProductionOrderId,
        /// Repeat the advance this many times.
        #[serde(default = "one")]
        times: u32,
    },
    /// Advance until the production order completes.
    CompleteProduction {
        production_order: ProductionOrderId,
    },
    ConfirmReadyForDelivery {
        production_order: ProductionOrderId,
    },
    RecordDelivery {
        sales_order: SalesOrderId,
    },
    IssueInvoice {
        sales_order: SalesOrderId,
    },
}

fn one() -> u32 {
    1
}

impl ScriptOp {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptOp::CreateSalesOrder { .. } => "create_sales_order",
            ScriptOp::PromoteToProduction { .. } => "promote_to_production",
            ScriptOp::StartProduction { .. } => "start_production",
            ScriptOp::AdvanceProduction { .. } => "advance_production",
            ScriptOp::CompleteProduction { .. } => "complete_production",
            ScriptOp::ConfirmReadyForDelivery { .. } => "confirm_ready_for_delivery",
            ScriptOp::RecordDelivery { .. } => "record_delivery",
            ScriptOp::IssueInvoice { .. } => "issue_invoice",
        }
    }

    /// Run the step; returns a one-line description of what happened.
    pub fn apply(&self, manager: &mut OrderLifecycleManager) -> Result<String, DomainError> {
        match self {
            ScriptOp::CreateSalesOrder {
                customer,
                sku,
                quantity,
            } => {
                let order = manager.create_sales_order(customer, sku, *quantity)?;
                Ok(format!("created {} ({})", order.id_typed(), order.total()))
            }
            ScriptOp::PromoteToProduction { sales_order } => {
                let po = manager.promote_to_production(*sales_order)?;
                Ok(format!("{sales_order} promoted to {}", po.id_typed()))
            }
            ScriptOp::StartProduction { production_order } => {
                let po = manager.start_production(*production_order)?;
                Ok(format!("{production_order} started at {}", po.completion()))
            }
            ScriptOp::AdvanceProduction {
                production_order,
                times,
            } => {
                let mut completion = None;
                for _ in 0..*times {
                    completion = Some(manager.advance_production(*production_order)?.completion());
                }
                Ok(match completion {
                    Some(c) => format!("{production_order} at {c}"),
                    None => format!("{production_order} unchanged"),
                })
            }
            ScriptOp::CompleteProduction { production_order } => {
                while !manager.production_order(*production_order)?.is_completed() {
                    manager.advance_production(*production_order)?;
                }
                Ok(format!("{production_order} completed"))
            }
            ScriptOp::ConfirmReadyForDelivery { production_order } => {
                let order = manager.confirm_ready_for_delivery(*production_order)?;
                Ok(format!("{} ready for delivery", order.id_typed()))
            }
            ScriptOp::RecordDelivery { sales_order } => {
                let delivery = manager.record_delivery(*sales_order)?;
                Ok(format!(
                    "{sales_order} shipped as {} ({})",
                    delivery.id_typed(),
                    delivery
                        .tracking_code()
                        .map(|c| c.as_str())
                        .unwrap_or_default()
                ))
            }
            ScriptOp::IssueInvoice { sales_order } => {
                let invoice = manager.issue_invoice(*sales_order)?;
                Ok(format!("issued {} for {}", invoice.id_typed(), invoice.amount()))
            }
        }
    }
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptOp>> {
    serde_json::from_str(json).context("script is not a valid list of operations")
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptOp>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("failed to parse script {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// 1-based position in the script.
    pub step: usize,
    pub op: &'static str,
    pub error: DomainError,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub applied: usize,
    pub failures: Vec<StepFailure>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `ops` in order. Stops at the first failure unless `keep_going`.
pub fn execute(
    manager: &mut OrderLifecycleManager,
    ops: &[ScriptOp],
    keep_going: bool,
) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    for (index, op) in ops.iter().enumerate() {
        let step = index + 1;
        match op.apply(manager) {
            Ok(description) => {
                tracing::info!(step, op = op.name(), "{description}");
                outcome.applied += 1;
            }
            Err(error) => {
                tracing::warn!(step, op = op.name(), kind = error.kind(), error = %error, "step failed");
                outcome.failures.push(StepFailure {
                    step,
                    op: op.name(),
                    error,
                });
                if !keep_going {
                    break;
                }
            }
        }
    }

    outcome
}
