//! Read-only aggregate queries over the manager's state.

use rust_decimal::Decimal;
use serde::Serialize;

use fabflow_production::{ProductionOrder, ProductionStatus};
use fabflow_sales::{SalesOrder, SalesOrderStatus};

use crate::manager::OrderLifecycleManager;

/// One step of the order-to-delivery funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionStage {
    pub stage: &'static str,
    pub count: usize,
    /// Share of all sales orders, one decimal place.
    pub percent: Decimal,
}

/// Headline figures of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleSummary {
    pub sales_orders: usize,
    pub pending_production: usize,
    pub active_production_orders: usize,
    pub ready_for_delivery: usize,
    pub delivered_orders: usize,
    pub invoices: usize,
    pub delivered_revenue: Decimal,
    pub average_order_value: Option<Decimal>,
    pub average_sustainability_score: Option<Decimal>,
}

impl OrderLifecycleManager {
    /// Sales orders still waiting to be promoted (`Created`).
    pub fn orders_pending_production(&self) -> Vec<&SalesOrder> {
        self.orders_with_status(SalesOrderStatus::Created)
    }

    /// Production orders whose sales order has not been delivered yet.
    pub fn active_production_orders(&self) -> Vec<&ProductionOrder> {
        self.production_orders
            .values()
            .filter(|po| {
                po.sales_order_id()
                    .and_then(|so| self.sales_orders.get(&so))
                    .is_some_and(|order| !order.is_delivered())
            })
            .collect()
    }

    /// Completed production orders whose sales order is still `In Production`.
    pub fn production_awaiting_confirmation(&self) -> Vec<&ProductionOrder> {
        self.production_orders
            .values()
            .filter(|po| po.is_completed())
            .filter(|po| {
                po.sales_order_id()
                    .and_then(|so| self.sales_orders.get(&so))
                    .is_some_and(|order| order.status() == SalesOrderStatus::InProduction)
            })
            .collect()
    }

    pub fn orders_ready_for_delivery(&self) -> Vec<&SalesOrder> {
        self.orders_with_status(SalesOrderStatus::ReadyForDelivery)
    }

    pub fn delivered_orders(&self) -> Vec<&SalesOrder> {
        self.orders_with_status(SalesOrderStatus::Delivered)
    }

    /// Sum of totals over delivered orders; zero when there are none.
    ///
    /// Saturates at `Decimal::MAX` when the sum leaves the decimal range.
    pub fn delivered_revenue(&self) -> Decimal {
        let totals = self.delivered_orders().into_iter().map(SalesOrder::total);
        checked_sum(totals.clone()).unwrap_or_else(|| {
            tracing::warn!("delivered revenue exceeds the decimal range; reporting the maximum");
            totals.fold(Decimal::ZERO, |acc, t| acc.saturating_add(t))
        })
    }

    /// Mean total of delivered orders, to the cent.
    pub fn average_delivered_order_value(&self) -> Option<Decimal> {
        let delivered = self.delivered_orders();
        if delivered.is_empty() {
            return None;
        }
        let count = Decimal::from(delivered.len());
        let totals = delivered.iter().map(|o| o.total());
        let mean = match checked_sum(totals.clone()) {
            Some(sum) => sum / count,
            // Each share is at most the largest total, so this sum stays in range.
            None => totals.fold(Decimal::ZERO, |acc, t| acc.saturating_add(t / count)),
        };
        Some(mean.round_dp(2))
    }

    /// Mean sustainability score of the products of all sales orders.
    pub fn average_sustainability_score(&self) -> Option<Decimal> {
        let scores: Vec<u8> = self
            .sales_orders
            .values()
            .filter_map(|o| o.sku())
            .filter_map(|sku| self.catalog().get(sku.as_str()))
            .map(|p| p.sustainability_score().value())
            .collect();

        if scores.is_empty() {
            return None;
        }
        let sum: Decimal = scores.iter().map(|s| Decimal::from(*s)).sum();
        Some((sum / Decimal::from(scores.len())).round_dp(1))
    }

    /// Created → production started → production completed → delivered.
    pub fn completion_stages(&self) -> Vec<CompletionStage> {
        let total = self.sales_orders.len();
        let started = self
            .production_orders
            .values()
            .filter(|po| po.status() != ProductionStatus::Planned)
            .count();
        let completed = self
            .production_orders
            .values()
            .filter(|po| po.is_completed())
            .count();

        [
            ("Orders Created", total),
            ("Production Started", started),
            ("Production Completed", completed),
            ("Orders Delivered", self.delivered_orders().len()),
        ]
        .into_iter()
        .map(|(stage, count)| CompletionStage {
            stage,
            count,
            percent: share(count, total),
        })
        .collect()
    }

    pub fn summary(&self) -> LifecycleSummary {
        let summary = LifecycleSummary {
            sales_orders: self.sales_orders.len(),
            pending_production: self.orders_pending_production().len(),
            active_production_orders: self.active_production_orders().len(),
            ready_for_delivery: self.orders_ready_for_delivery().len(),
            delivered_orders: self.delivered_orders().len(),
            invoices: self.invoices.len(),
            delivered_revenue: self.delivered_revenue(),
            average_order_value: self.average_delivered_order_value(),
            average_sustainability_score: self.average_sustainability_score(),
        };
        tracing::debug!(?summary, "summary computed");
        summary
    }

    fn orders_with_status(&self, status: SalesOrderStatus) -> Vec<&SalesOrder> {
        self.sales_orders
            .values()
            .filter(|o| o.status() == status)
            .collect()
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

fn share(count: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(1)
}
