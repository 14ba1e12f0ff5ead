//! Delivery and billing: the records that close out a sales order.

pub mod delivery;
pub mod invoice;
pub mod tracking;

pub use delivery::{
    Delivery, DeliveryCommand, DeliveryEvent, DeliveryId, DeliveryShipped, DeliveryStatus,
    ShipDelivery,
};
pub use invoice::{Invoice, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceIssued, IssueInvoice};
pub use tracking::{
    SequentialTrackingCodes, TrackingCode, TrackingCodeGenerator, UuidTrackingCodes,
};
