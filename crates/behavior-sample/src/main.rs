//! # Behavior Runtime Sample
//!
//! Two small applications on top of the behavior runtime.
//!
//! ## Core Components
//!
//! - **[account_actor](behavior_sample::account_actor)**: an event-sourced bank account.
//! - **[stats_actor](behavior_sample::stats_actor)**: a word statistics service fanning out
//!   to a consistent-hashing pool.
//! - **[clients](behavior_sample::clients)**: typed wrappers that hide message passing.
//! - **[lifecycle](behavior_sample::lifecycle)**: [`SampleSystem`], which starts the actors
//!   and shuts them down.
//!
//! Run with `RUST_LOG=info cargo run -p behavior-sample`.

use behavior_runtime::tracing::setup_tracing;
use behavior_sample::lifecycle::SampleSystem;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting sample system");
    let system = SampleSystem::new().map_err(|e| e.to_string())?;

    let span = tracing::info_span!("account_flow");
    async {
        let alice = system.open_account("alice").map_err(|e| e.to_string())?;
        alice.create().await.map_err(|e| e.to_string())?;
        alice.deposit(100).await.map_err(|e| e.to_string())?;
        alice.withdraw(30).await.map_err(|e| e.to_string())?;

        match alice.withdraw(500).await {
            Ok(()) => error!("Overdraft was accepted"),
            Err(e) => info!(error = %e, "Overdraft rejected"),
        }

        let balance = alice.balance().await.map_err(|e| e.to_string())?;
        info!(balance, "Account balance");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("stats_flow");
    async {
        let text = "this is the text that will be analyzed";
        match system.stats_client.mean_word_length(text).await {
            Ok(mean) => info!(text, mean, "Mean word length"),
            Err(e) => error!(error = %e, "Stats job failed"),
        }
    }
    .instrument(span)
    .await;

    system.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
