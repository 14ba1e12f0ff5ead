//! Text output for the terminal.

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use fabflow_catalog::ProductCatalog;
use fabflow_lifecycle::{
    CompletionStage, LifecycleSummary, OrderLifecycleManager, OrderTrackingRow, export_csv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    orders: &'a [OrderTrackingRow],
    stages: &'a [CompletionStage],
    summary: &'a LifecycleSummary,
}

/// The tracking report plus funnel and summary, in `format`.
pub fn report(manager: &OrderLifecycleManager, format: OutputFormat) -> Result<String> {
    let rows = manager.tracking_report();
    match format {
        OutputFormat::Csv => Ok(export_csv(&rows)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&Report {
            orders: &rows,
            stages: &manager.completion_stages(),
            summary: &manager.summary(),
        })?),
        OutputFormat::Table => {
            let mut out = tracking_table(&rows);
            out.push('\n');
            out.push_str(&stages_table(&manager.completion_stages()));
            out.push('\n');
            out.push_str(&summary_table(&manager.summary()));
            Ok(out)
        }
    }
}

pub fn catalog(catalog: &ProductCatalog, format: OutputFormat) -> Result<String> {
    let products: Vec<_> = catalog.iter().collect();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&products)?),
        OutputFormat::Csv => {
            let mut out = String::from("sku,name,category,unit_price,sustainability_score\n");
            for p in products {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{}",
                    p.sku().as_str(),
                    p.name(),
                    p.category(),
                    p.unit_price(),
                    p.sustainability_score().value()
                );
            }
            Ok(out)
        }
        OutputFormat::Table => {
            let mut out = format!(
                "{:<8} {:<30} {:<16} {:>8} {:>6}\n",
                "SKU", "Product", "Category", "Price", "Score"
            );
            for p in products {
                let _ = writeln!(
                    out,
                    "{:<8} {:<30} {:<16} {:>8} {:>6}",
                    p.sku().as_str(),
                    p.name(),
                    p.category(),
                    p.unit_price(),
                    p.sustainability_score().value()
                );
            }
            Ok(out)
        }
    }
}

fn tracking_table(rows: &[OrderTrackingRow]) -> String {
    let mut out = format!(
        "{:<8} {:<14} {:<8} {:>4} {:>9} {:<19} {:<8} {:<12} {:>5} {:<12} {:<12}\n",
        "Order", "Customer", "SKU", "Qty", "Total", "Status", "Prod", "Prod Status", "Done",
        "Tracking", "Invoice"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<8} {:<14} {:<8} {:>4} {:>9} {:<19} {:<8} {:<12} {:>5} {:<12} {:<12}",
            row.sales_order_id.to_string(),
            row.customer,
            row.sku,
            row.quantity,
            row.total,
            row.order_status.label(),
            or_dash(row.production_order_id),
            row.production_status
                .map(|s| s.label())
                .unwrap_or("Not Created"),
            row.completion
                .map(|c| format!("{c}%"))
                .unwrap_or_else(|| "-".to_string()),
            row.tracking_code
                .as_ref()
                .map(|c| c.as_str())
                .unwrap_or("Not Shipped"),
            or_dash(row.invoice_id),
        );
    }
    out
}

fn stages_table(stages: &[CompletionStage]) -> String {
    let mut out = format!("{:<22} {:>6} {:>7}\n", "Stage", "Orders", "Share");
    for stage in stages {
        let _ = writeln!(
            out,
            "{:<22} {:>6} {:>6}%",
            stage.stage, stage.count, stage.percent
        );
    }
    out
}

fn summary_table(summary: &LifecycleSummary) -> String {
    let mut out = String::new();
    let lines: [(&str, String); 9] = [
        ("Sales orders", summary.sales_orders.to_string()),
        ("Pending production", summary.pending_production.to_string()),
        ("Active production orders", summary.active_production_orders.to_string()),
        ("Ready for delivery", summary.ready_for_delivery.to_string()),
        ("Delivered orders", summary.delivered_orders.to_string()),
        ("Invoices", summary.invoices.to_string()),
        ("Delivered revenue", summary.delivered_revenue.to_string()),
        ("Average order value", or_dash(summary.average_order_value)),
        (
            "Avg sustainability score",
            or_dash(summary.average_sustainability_score),
        ),
    ];
    for (label, value) in lines {
        let _ = writeln!(out, "{label:<26} {value}");
    }
    out
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
