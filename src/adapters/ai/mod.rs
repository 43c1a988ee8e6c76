//! Model provider adapters.
//!
//! - `GatewayModelProvider` - reqwest client for the HTTP model gateway
//! - `MockModelProvider` - scripted provider for tests and offline runs

mod gateway_provider;
mod mock_provider;

pub use gateway_provider::{GatewayConfig, GatewayModelProvider};
pub use mock_provider::{MockError, MockModelProvider, MockReply, ANY_MODEL};
