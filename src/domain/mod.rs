//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, identity, timestamps, clock, errors)
//! - `rate_limit` - Hourly/daily quota window arithmetic
//! - `conversation` - Messages, split-screen lanes, conversation record
//! - `context` - Domain-shift detection and milestone suggestions
//! - `routing` - Model id to provider mapping
//! - `settings` - Session AI configuration and patch rules
//! - `enhancement` - Reply post-processing pipeline
//! - `events` - Typed engine events

pub mod context;
pub mod conversation;
pub mod enhancement;
pub mod events;
pub mod foundation;
pub mod rate_limit;
pub mod routing;
pub mod settings;
