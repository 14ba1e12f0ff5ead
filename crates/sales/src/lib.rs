//! Sales orders (event-driven).
//!
//! Business rules for customer sales orders, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod order;

pub use order::{
    CreateSalesOrder, MarkDelivered, MarkInProduction, MarkReadyForDelivery, OrderDelivered,
    OrderInProduction, OrderReadyForDelivery, SalesOrder, SalesOrderCommand, SalesOrderCreated,
    SalesOrderEvent, SalesOrderId, SalesOrderStatus,
};
