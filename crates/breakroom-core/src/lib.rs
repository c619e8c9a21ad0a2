//! # Breakroom Core Library
//!
//! Core scheduling engine for the Breakroom break reminder. It
//! implements a CLI-first philosophy where all operations are available
//! via a standalone CLI binary, with any tray or window frontend being
//! a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Scheduler**: a single-slot wall-clock countdown; the caller
//!   periodically invokes `tick()` to drive expiry
//! - **Planner**: the break state machine layered on the scheduler,
//!   owning cadence selection, pause/resume, postponement and the
//!   suppression set
//! - **Storage**: SQLite-based break history and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`BreakPlanner`]: the scheduling state machine
//! - [`Scheduler`]: the underlying single-shot countdown
//! - [`Config`] / [`Database`]: preferences and break history
//! - [`Event`]: lifecycle transitions the embedding reacts to

pub mod duration;
pub mod error;
pub mod events;
pub mod planner;
pub mod scheduler;
pub mod settings;
pub mod status;
pub mod storage;
pub mod suppression;

pub use duration::{parse_duration_ms, parse_pause_ms};
pub use error::{ConfigError, PlannerError, StoreError};
pub use events::Event;
pub use planner::BreakPlanner;
pub use scheduler::{EventKind, PausedPlan, Scheduler};
pub use settings::{BreakKind, BreakKindSettings, BreakSettings};
pub use status::Status;
pub use storage::{Config, Database};
pub use suppression::{
    AppExclusionsManager, DndManager, NaturalBreaksManager, Suppression,
};
