//! Suppression sources.
//!
//! Each manager owns its own watch state and reports edge-triggered
//! decisions; the planner folds them into a set and only resumes
//! scheduling when the set is empty. The managers never touch planner
//! state directly.

mod app_exclusions;
mod dnd;
mod natural_breaks;

pub use app_exclusions::AppExclusionsManager;
pub use dnd::DndManager;
pub use natural_breaks::NaturalBreaksManager;

use serde::{Deserialize, Serialize};

/// A named condition that prevents the schedule from advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Suppression {
    /// User-initiated pause; its interrupted plan is restorable.
    ManualPause,
    /// System Do-Not-Disturb is active.
    Dnd,
    /// An excluded application holds the foreground.
    AppExclusion,
    /// The user is already idle; a scheduled break would be redundant.
    NaturalBreak,
}
