//! Built-in scenario: one order through the whole lifecycle, with a few
//! others left at earlier stages so the report has something to compare.

use fabflow_core::DomainResult;
use fabflow_lifecycle::OrderLifecycleManager;

pub fn run(manager: &mut OrderLifecycleManager) -> DomainResult<()> {
    let acme = manager.create_sales_order("Acme", "PKG001", 3)?.id_typed();
    let acme_po = manager.promote_to_production(acme)?.id_typed();
    manager.start_production(acme_po)?;
    while !manager.production_order(acme_po)?.is_completed() {
        manager.advance_production(acme_po)?;
    }
    manager.confirm_ready_for_delivery(acme_po)?;
    manager.record_delivery(acme)?;
    manager.issue_invoice(acme)?;

    let bloom = manager.create_sales_order("Bloom & Co", "PKG006", 20)?.id_typed();
    let bloom_po = manager.promote_to_production(bloom)?.id_typed();
    manager.start_production(bloom_po)?;
    manager.advance_production(bloom_po)?;

    manager.create_sales_order("Green Grocer", "PKG003", 50)?;
    Ok(())
}
