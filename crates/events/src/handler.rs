/// Execute an aggregate command in place: decide, then apply every event.
///
/// Useful for single-aggregate flows and tests. Multi-aggregate operations
/// decide all events first and apply them afterwards instead.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: fabflow_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
