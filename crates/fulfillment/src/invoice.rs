//! Billing: one invoice per delivered sales order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fabflow_core::{Aggregate, AggregateRoot, DomainError};
use fabflow_events::Event;
use fabflow_sales::SalesOrderId;

/// Invoice number, derived from the billed order: `INV-SO0001`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceId(SalesOrderId);

impl InvoiceId {
    pub const PREFIX: &'static str = "INV-";

    pub fn for_order(sales_order_id: SalesOrderId) -> Self {
        Self(sales_order_id)
    }

    pub fn sales_order_id(&self) -> SalesOrderId {
        self.0
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl core::str::FromStr for InvoiceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let order = s
            .trim()
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| DomainError::invalid_id(format!("{s:?}: expected prefix INV-")))?;
        Ok(Self(order.parse()?))
    }
}

impl TryFrom<String> for InvoiceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InvoiceId> for String {
    fn from(value: InvoiceId) -> Self {
        value.to_string()
    }
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    customer_name: String,
    amount: Decimal,
    issued_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Invoice {
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            customer_name: String::new(),
            amount: Decimal::ZERO,
            issued_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn sales_order_id(&self) -> SalesOrderId {
        self.id.sales_order_id()
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn is_issued(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IssueInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInvoice {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    IssueInvoice(IssueInvoice),
}

/// Event: InvoiceIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub invoice_id: InvoiceId,
    pub customer_name: String,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceIssued(InvoiceIssued),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceIssued(_) => "fulfillment.invoice.issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceIssued(e) => {
                self.id = e.invoice_id;
                self.customer_name = e.customer_name.clone();
                self.amount = e.amount;
                self.issued_at = Some(e.occurred_at);
                self.created = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::IssueInvoice(cmd) => {
                if self.created {
                    return Err(DomainError::invalid_transition(format!(
                        "invoice {} has already been issued",
                        self.id
                    )));
                }
                if cmd.amount <= Decimal::ZERO {
                    return Err(DomainError::validation("invoice amount must be positive"));
                }

                Ok(vec![InvoiceEvent::InvoiceIssued(InvoiceIssued {
                    invoice_id: cmd.invoice_id,
                    customer_name: cmd.customer_name.clone(),
                    amount: cmd.amount,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}
