#![forbid(unsafe_code)]

use conledger_kernel_contracts::events::{LedgerEventId, LedgerEventInput, LedgerEventKind};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::LedgerStore;

use crate::error::LedgerError;

/// Builds and validates a notification before any state is touched, so the
/// later append cannot fail halfway through an operation.
pub(crate) fn prepare(
    now: MonotonicTimeNs,
    kind: LedgerEventKind,
) -> Result<LedgerEventInput, LedgerError> {
    Ok(LedgerEventInput::v1(now, kind)?)
}

pub(crate) fn publish(
    store: &mut LedgerStore,
    input: LedgerEventInput,
) -> Result<LedgerEventId, LedgerError> {
    let name = input.kind.name();
    let event_id = store.append_ledger_event(input)?;
    tracing::trace!(
        event_id = event_id.0,
        event = name,
        "ledger notification appended"
    );
    Ok(event_id)
}
