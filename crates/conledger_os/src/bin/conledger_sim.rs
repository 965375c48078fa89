#![forbid(unsafe_code)]

use conledger_engines::reference_oracle::ReferenceDecryptionOracle;
use conledger_engines::symbolic_fhe::SymbolicFhe;
use conledger_kernel_contracts::access::ActorId;
use conledger_kernel_contracts::batch::{ClaimSubmission, PolicySubmission};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_os::{ConfidentialLedger, LedgerConfig, LedgerError};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let config = LedgerConfig::from_env().map_err(|e| e.to_string())?;
    let step_ns = config.initial_cooldown_ns;
    let owner = actor("insurer_owner")?;
    let provider = actor("provider_a")?;

    let mut ledger = ConfidentialLedger::new(
        &config,
        owner.clone(),
        SymbolicFhe::new(),
        ReferenceDecryptionOracle::generate(),
    )
    .map_err(render)?;

    let mut clock = Clock::new(step_ns);
    ledger
        .add_provider(&owner, clock.tick(), provider.clone())
        .map_err(render)?;
    let batch_id = ledger.open_batch(&owner, clock.tick()).map_err(render)?;

    for (coverage, risk_factor, premium) in [(100, 5, 10), (200, 3, 20)] {
        let submission = PolicySubmission {
            batch_id,
            coverage: ledger.fhe_mut().encrypt(coverage),
            risk_factor: ledger.fhe_mut().encrypt(risk_factor),
            premium: ledger.fhe_mut().encrypt(premium),
        };
        ledger
            .submit_policy(&provider, clock.tick(), submission)
            .map_err(render)?;
    }
    let claim = ClaimSubmission {
        batch_id,
        claim_amount: ledger.fhe_mut().encrypt(50),
        policy_ref: ledger.fhe_mut().encrypt(0),
    };
    ledger
        .submit_claim(&provider, clock.tick(), claim)
        .map_err(render)?;
    ledger
        .close_batch(&owner, clock.tick(), batch_id)
        .map_err(render)?;

    let ticket = ledger
        .request_batch_totals_decryption(&provider, clock.tick(), batch_id)
        .map_err(render)?;
    let fulfillment = ledger
        .oracle()
        .fulfill(ticket.request_id, ledger.fhe())
        .map_err(|e| e.to_string())?;
    let totals = ledger
        .on_decryption_callback(
            clock.tick(),
            fulfillment.request_id,
            &fulfillment.cleartexts,
            &fulfillment.proof,
        )
        .map_err(render)?;
    tracing::info!(
        total_coverage = totals.total_coverage,
        total_premium = totals.total_premium,
        total_claims = totals.total_claims,
        "batch totals revealed"
    );

    match ledger.on_decryption_callback(
        clock.tick(),
        fulfillment.request_id,
        &fulfillment.cleartexts,
        &fulfillment.proof,
    ) {
        Err(LedgerError::ReplayDetected { .. }) => {}
        Ok(_) => return Err("replayed callback was accepted".to_string()),
        Err(other) => return Err(render(other)),
    }

    let log = serde_json::to_string_pretty(ledger.events()).map_err(|e| e.to_string())?;
    println!("{log}");
    Ok(())
}

/// Advances by one full cooldown per step so no action is rate limited.
struct Clock {
    now: u64,
    step_ns: u64,
}

impl Clock {
    fn new(step_ns: u64) -> Self {
        Self { now: 0, step_ns }
    }

    fn tick(&mut self) -> MonotonicTimeNs {
        self.now = self.now.saturating_add(self.step_ns.max(1));
        MonotonicTimeNs(self.now)
    }
}

fn actor(id: &str) -> Result<ActorId, String> {
    ActorId::new(id).map_err(|e| e.to_string())
}

fn render(err: LedgerError) -> String {
    format!("ledger error {:#010x}: {err}", err.reason_code().0)
}
