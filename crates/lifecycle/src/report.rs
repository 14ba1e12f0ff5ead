//! Order tracking report: one row per sales order, joined with its
//! production order, delivery, invoice and product.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use fabflow_fulfillment::{DeliveryId, InvoiceId, TrackingCode};
use fabflow_production::{ProductionOrderId, ProductionStatus};
use fabflow_sales::{SalesOrderId, SalesOrderStatus};

use crate::manager::OrderLifecycleManager;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer could not be flushed: {0}")]
    Flush(String),

    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One line of the tracking report. Stages not reached yet are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTrackingRow {
    pub sales_order_id: SalesOrderId,
    pub customer: String,
    pub sku: String,
    pub product: String,
    pub quantity: u32,
    pub total: Decimal,
    pub order_status: SalesOrderStatus,
    pub production_order_id: Option<ProductionOrderId>,
    pub production_status: Option<ProductionStatus>,
    pub completion: Option<u8>,
    pub delivery_id: Option<DeliveryId>,
    pub tracking_code: Option<TrackingCode>,
    pub invoice_id: Option<InvoiceId>,
    pub sustainability_score: Option<u8>,
}

impl OrderLifecycleManager {
    /// Rows in sales order id order.
    pub fn tracking_report(&self) -> Vec<OrderTrackingRow> {
        self.sales_orders()
            .map(|order| {
                let id = order.id_typed();
                let sku = order.sku().map(|s| s.as_str()).unwrap_or_default();
                let product = self.catalog().get(sku);
                let production = self.production_for_sales_order(id);
                let delivery = production
                    .and_then(|po| self.delivery_for_production_order(po.id_typed()));
                let invoice_id = InvoiceId::for_order(id);

                OrderTrackingRow {
                    sales_order_id: id,
                    customer: order.customer_name().to_string(),
                    sku: sku.to_string(),
                    product: product.map(|p| p.name().to_string()).unwrap_or_default(),
                    quantity: order.quantity(),
                    total: order.total(),
                    order_status: order.status(),
                    production_order_id: production.map(|po| po.id_typed()),
                    production_status: production.map(|po| po.status()),
                    completion: production.map(|po| po.completion_percentage()),
                    delivery_id: delivery.map(|d| d.id_typed()),
                    tracking_code: delivery.and_then(|d| d.tracking_code().cloned()),
                    invoice_id: self.invoices.contains_key(&invoice_id).then_some(invoice_id),
                    sustainability_score: product.map(|p| p.sustainability_score().value()),
                }
            })
            .collect()
    }

    pub fn tracking_report_csv(&self) -> Result<String, ReportError> {
        export_csv(&self.tracking_report())
    }
}

/// Column names of the CSV export, in [`OrderTrackingRow`] field order.
pub const TRACKING_CSV_HEADER: [&str; 14] = [
    "sales_order_id",
    "customer",
    "sku",
    "product",
    "quantity",
    "total",
    "order_status",
    "production_order_id",
    "production_status",
    "completion",
    "delivery_id",
    "tracking_code",
    "invoice_id",
    "sustainability_score",
];

/// Render rows as CSV with a header line, written even when there are no
/// rows; absent values are empty fields.
pub fn export_csv(rows: &[OrderTrackingRow]) -> Result<String, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(TRACKING_CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabflow_fulfillment::SequentialTrackingCodes;
    use rust_decimal_macros::dec;

    fn manager() -> OrderLifecycleManager {
        OrderLifecycleManager::default().with_tracking_codes(SequentialTrackingCodes::new("TRK"))
    }

    #[test]
    fn rows_follow_each_order_through_its_stages() {
        let mut m = manager();
        let delivered = m.create_sales_order("Acme", "PKG001", 3).unwrap().id_typed();
        let po = m.promote_to_production(delivered).unwrap().id_typed();
        m.start_production(po).unwrap();
        for _ in 0..3 {
            m.advance_production(po).unwrap();
        }
        m.confirm_ready_for_delivery(po).unwrap();
        m.record_delivery(delivered).unwrap();
        m.issue_invoice(delivered).unwrap();
        m.create_sales_order("Globex", "PKG004", 2).unwrap();

        let rows = m.tracking_report();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.sales_order_id.to_string(), "SO0001");
        assert_eq!(first.product, "Eco-Friendly Bouquet Wrapper");
        assert_eq!(first.total, dec!(47.97));
        assert_eq!(first.order_status, SalesOrderStatus::Delivered);
        assert_eq!(first.production_status, Some(ProductionStatus::Completed));
        assert_eq!(first.completion, Some(100));
        assert_eq!(first.tracking_code.as_ref().map(|c| c.as_str()), Some("TRK00000001"));
        assert_eq!(first.invoice_id.map(|i| i.to_string()).as_deref(), Some("INV-SO0001"));
        assert_eq!(first.sustainability_score, Some(95));

        let second = &rows[1];
        assert_eq!(second.order_status, SalesOrderStatus::Created);
        assert_eq!(second.production_order_id, None);
        assert_eq!(second.delivery_id, None);
        assert_eq!(second.invoice_id, None);
    }

    #[test]
    fn csv_has_header_and_blank_missing_stages() {
        let mut m = manager();
        m.create_sales_order("Acme", "PKG001", 3).unwrap();

        let csv = m.tracking_report_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "sales_order_id,customer,sku,product,quantity,total,order_status,\
             production_order_id,production_status,completion,delivery_id,\
             tracking_code,invoice_id,sustainability_score"
        );
        assert_eq!(
            lines.next().unwrap(),
            "SO0001,Acme,PKG001,Eco-Friendly Bouquet Wrapper,3,47.97,Created,,,,,,,95"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_report_still_has_a_header() {
        let csv = export_csv(&[]).unwrap();
        assert_eq!(csv, format!("{}\n", TRACKING_CSV_HEADER.join(",")));
    }
}
