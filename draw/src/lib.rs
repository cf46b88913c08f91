//! Winner selection for ended giveaways.
//!
//! A draw runs through five stages:
//! - [`gate`]: the giveaway must be `ended` and have participants
//! - [`guard`]: repeated or concurrent invocations never re-draw
//! - [`oracle`]: verified, giveaway-bound randomness with a bounded wait
//! - [`selector`]: deterministic mapping of that randomness onto participants
//! - [`commit`]: one conditional `ended -> drawn` write, retried with the same result
//!
//! [`DrawService`] wires them together; [`GiveawayService`] covers the
//! creator-side lifecycle that leads up to a draw.

pub mod commit;
pub mod config;
pub mod error;
pub mod gate;
pub mod giveaways;
pub mod guard;
pub mod metrics;
pub mod oracle;
pub mod selector;
pub mod service;

pub use config::DrawConfig;
pub use error::{DrawError, GiveawayError};
pub use giveaways::GiveawayService;
pub use metrics::DrawMetrics;
pub use selector::WinnerSelector;
pub use service::{AuditReport, DrawOutcome, DrawService};
