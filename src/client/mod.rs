// ABOUTME: Session engine client API: bind/unbind lifecycle, message submission and observation
// ABOUTME: Exports the engine, its configuration types, keep-alive policy and error types

//! SMPP Session Engine
//!
//! [`SessionEngine`] owns one SMPP session. It binds over a [`Connector`]
//! (TCP by default), submits messages split by the segmenter, answers
//! unsolicited PDUs from the SMSC and records protocol activity in a
//! bounded event log that a UI can poll or subscribe to.
//!
//! ## States
//!
//! `Unbound -> Binding -> Bound -> Unbinding -> Unbound`. A rejected bind
//! passes through `Error` on its way back to `Unbound`; a dropped connection
//! while bound goes straight to `Unbound`. There is no automatic rebind.
//!
//! ## Observing
//!
//! ```rust,no_run
//! use smpp_sender::client::{EngineConfig, SessionEngine};
//!
//! # async fn example() {
//! let engine = SessionEngine::new(EngineConfig::default());
//! let mut states = engine.subscribe_state();
//! let mut log = engine.subscribe_log();
//!
//! tokio::spawn(async move {
//!     while log.changed().await.is_ok() {
//!         for entry in log.borrow_and_update().iter() {
//!             println!("[{}] {}", entry.category, entry.message);
//!         }
//!     }
//! });
//!
//! while states.changed().await.is_ok() {
//!     println!("state: {}", *states.borrow_and_update());
//! }
//! # }
//! ```
//!
//! [`Connector`]: crate::transport::Connector

pub mod engine;
pub mod error;
pub mod keepalive;
pub mod state;
pub mod types;

pub use engine::SessionEngine;
pub use error::{SmppError, SmppResult};
pub use keepalive::{KeepAliveConfig, KeepAliveManager, KeepAliveStatus};
pub use state::SessionState;
pub use types::{
    ConnectionConfig, EngineConfig, OutboundMessage, OutboundMessageBuilder, PartOutcome,
    PartResult,
};
