//! # Observability & Tracing
//!
//! The runtime logs through the `tracing` crate. Every actor task runs inside an `actor`
//! span carrying its id and path, so a line logged by a behavior shows which actor wrote it.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: spawn, start, stop and envelopes discarded on stop (`info`)
//! - **Dispatch**: behavior replacements, unhandled messages, watches (`debug`)
//! - **Timers & Dead Letters**: timer starts, stale fires, deliveries to stopped actors (`trace`)
//! - **Routers & Persistence**: routee churn, recovery and persisted events
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Include every transition and unhandled message
//! RUST_LOG=behavior_runtime=debug cargo run
//! ```
//!
//! The compact format shows the span inline:
//!
//! ```text
//! INFO actor{id=#3 path=/user/stats}: Actor started message_type="StatsJob"
//! DEBUG actor{id=#3 path=/user/stats}: Behavior replaced from="receive" to="extensible"
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // The actor span already names the source.
        .compact()
        .init();
}
