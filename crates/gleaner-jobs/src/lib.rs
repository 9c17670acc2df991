//! # gleaner-jobs
//!
//! The poll cycle of gleaner.
//!
//! This crate provides:
//! - The [`Pass`] trait and a [`PollWorker`] that runs passes sequentially,
//!   one non-overlapping cycle at a time, with event broadcast
//! - [`MeetingNotesPass`]: reprocessing gate, task synthesis, project
//!   inference and knowledge routing for meeting notes
//! - [`QuickEntryPass`]: the two-channel quick-entry state machine
//! - [`Router`]: section-targeted, order-preserving knowledge appends
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gleaner_jobs::{EngineConfig, MeetingNotesPass, QuickEntryPass, WorkerBuilder, WorkerConfig};
//!
//! let config = EngineConfig::from_env()?;
//! let worker = WorkerBuilder::new()
//!     .with_config(WorkerConfig::from_env())
//!     .with_pass(MeetingNotesPass::new(store.clone(), classifier.clone(), config.clone()))
//!     .with_pass(QuickEntryPass::new(store, classifier, config))
//!     .build();
//!
//! let handle = worker.start();
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//! ```

pub mod config;
pub mod cooldown;
pub mod handler;
pub mod notes;
pub mod quick_entry;
pub mod routing;
pub mod tasks;
pub mod worker;

pub use config::EngineConfig;
pub use cooldown::FailureTracker;
pub use handler::{CycleContext, NoOpPass, Pass, PassReport};
pub use notes::{DocumentOutcome, MeetingNotesPass};
pub use quick_entry::{cleanup_action, is_quick_entry, ChannelState, Cleanup, QuickEntryPass};
pub use routing::{RouteReport, Router};
pub use tasks::{SynthesisReport, TaskSynthesizer};
pub use worker::{PollWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};
