//! Chat Orchestrator - conversation orchestration engine
//!
//! Gates each visitor's messages against hourly/daily quotas, detects when
//! the conversation moves between the technology and healthcare domains,
//! and dispatches turns to one model or to two models side by side.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
