//! Routing module - maps model identifiers to provider families.

mod provider_tag;
mod router;

pub use provider_tag::ProviderTag;
pub use router::{ModelRouter, COMPLEMENT_PRECEDENCE};
