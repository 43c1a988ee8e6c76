//! Notification adapters.
//!
//! - `LoggingNotifier` - writes notifications to the log only
//! - `WebhookNotifier` - JSON POST to an external mail/webhook relay

mod logging;
mod webhook;

pub use logging::LoggingNotifier;
pub use webhook::WebhookNotifier;
