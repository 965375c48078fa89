#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::{validate_cooldown_ns, ActorId};
use conledger_kernel_contracts::events::LedgerEventKind;
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::LedgerStore;

use crate::error::LedgerError;
use crate::notify;

/// Owner-only administration. None of these operations are gated by the
/// pause flag, so a paused ledger can always be unpaused.
#[derive(Debug, Default, Clone)]
pub struct AccessControlRuntime;

impl AccessControlRuntime {
    pub fn transfer_ownership(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        new_owner: ActorId,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::OwnershipTransferred {
                previous_owner: caller.clone(),
                new_owner: new_owner.clone(),
            },
        )?;
        store.set_owner(new_owner.clone())?;
        notify::publish(store, event)?;
        tracing::info!(previous_owner = %caller, new_owner = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Registers a provider. Re-adding an existing provider is not an error
    /// and still emits `ProviderAdded`.
    pub fn add_provider(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        provider: ActorId,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::ProviderAdded {
                provider: provider.clone(),
            },
        )?;
        let newly_added = store.insert_provider(provider.clone())?;
        notify::publish(store, event)?;
        tracing::info!(provider = %provider, newly_added, "provider registered");
        Ok(())
    }

    pub fn remove_provider(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        provider: ActorId,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::ProviderRemoved {
                provider: provider.clone(),
            },
        )?;
        let was_present = store.remove_provider(&provider);
        notify::publish(store, event)?;
        tracing::info!(provider = %provider, was_present, "provider removed");
        Ok(())
    }

    pub fn set_paused(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        paused: bool,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        let event = notify::prepare(now, LedgerEventKind::PauseToggled { paused })?;
        store.set_paused(paused);
        notify::publish(store, event)?;
        tracing::info!(paused, "pause flag set");
        Ok(())
    }

    pub fn set_cooldown(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        cooldown_ns: u64,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        validate_cooldown_ns(cooldown_ns).map_err(|_| LedgerError::InvalidParameter {
            field: "cooldown_ns",
            reason: "must be > 0",
        })?;
        let event = notify::prepare(now, LedgerEventKind::CooldownSet { cooldown_ns })?;
        store.set_cooldown_ns(cooldown_ns)?;
        notify::publish(store, event)?;
        tracing::info!(cooldown_ns, "cooldown updated");
        Ok(())
    }
}

pub(crate) fn require_owner(store: &LedgerStore, actor: &ActorId) -> Result<(), LedgerError> {
    if !store.access_control().is_owner(actor) {
        return Err(LedgerError::NotOwner {
            actor: actor.clone(),
        });
    }
    Ok(())
}

pub(crate) fn require_provider(store: &LedgerStore, actor: &ActorId) -> Result<(), LedgerError> {
    if !store.access_control().is_provider(actor) {
        return Err(LedgerError::NotProvider {
            actor: actor.clone(),
        });
    }
    Ok(())
}

pub(crate) fn require_not_paused(store: &LedgerStore) -> Result<(), LedgerError> {
    if store.access_control().paused {
        return Err(LedgerError::Paused);
    }
    Ok(())
}

/// Zero is the unset timestamp and never a valid action time.
pub(crate) fn require_action_time(now: MonotonicTimeNs) -> Result<(), LedgerError> {
    if now.0 == 0 {
        return Err(LedgerError::InvalidParameter {
            field: "now",
            reason: "must be > 0",
        });
    }
    Ok(())
}

pub(crate) fn require_submission_cooldown(
    store: &LedgerStore,
    actor: &ActorId,
    now: MonotonicTimeNs,
) -> Result<(), LedgerError> {
    require_cooldown_elapsed(
        actor,
        store.last_submission_at(actor),
        store.access_control().cooldown_ns,
        now,
    )
}

pub(crate) fn require_decryption_cooldown(
    store: &LedgerStore,
    actor: &ActorId,
    now: MonotonicTimeNs,
) -> Result<(), LedgerError> {
    require_cooldown_elapsed(
        actor,
        store.last_decryption_request_at(actor),
        store.access_control().cooldown_ns,
        now,
    )
}

/// An actor with no stamp is always allowed; otherwise `now` must have
/// reached `last + cooldown`.
fn require_cooldown_elapsed(
    actor: &ActorId,
    last: Option<MonotonicTimeNs>,
    cooldown_ns: u64,
    now: MonotonicTimeNs,
) -> Result<(), LedgerError> {
    let Some(last) = last else {
        return Ok(());
    };
    let ready_at = last.saturating_add_ns(cooldown_ns);
    if now < ready_at {
        tracing::debug!(
            actor = %actor,
            ready_at = ready_at.0,
            now = now.0,
            "cooldown refused action"
        );
        return Err(LedgerError::CooldownActive {
            actor: actor.clone(),
            ready_at,
        });
    }
    Ok(())
}
