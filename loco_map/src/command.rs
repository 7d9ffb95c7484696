// Ambient state of the game command currently being executed.
//
// Construction commands run in two phases: a query (price and validate
// without touching the map) and an apply (mutate). A third mode, ghost,
// places translucent preview elements that nothing else collides with. The
// mode, the company issuing the command, and a single pending error text
// travel together in `CommandContext`, which every clearance and terraform
// entry point takes by `&mut`.
//
// The context also collects outputs that don't fit a return value: the
// element-position flags the last clearance check worked out (is the new
// volume underground, under water) and the `WorldEvent`s produced by
// demolitions.
//
// Callers set the error text right before returning failure, so the last
// text set is the one shown.
//
// See also: `clearance.rs`, `terraform.rs`, `event.rs`.

use crate::event::WorldEvent;
use crate::types::CompanyId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

bitflags! {
    /// Command execution flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u8 {
        /// Mutate the world; without it the command only prices and validates.
        const APPLY = 1 << 0;
        /// Placing elements claimed by an AI company's plan.
        const AI_ALLOCATED = 1 << 4;
        /// Do not charge the company.
        const NO_PAYMENT = 1 << 5;
        /// Place translucent preview elements.
        const GHOST = 1 << 6;
        /// Nested demolition: suppress the per-building effects of a top-level
        /// removal.
        const FLAG_7 = 1 << 7;
    }
}

impl CommandFlags {
    pub fn is_apply(self) -> bool {
        self.contains(Self::APPLY)
    }

    pub fn is_ghost(self) -> bool {
        self.contains(Self::GHOST)
    }
}

bitflags! {
    /// Where a checked volume sits relative to the terrain and water.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementPositionFlags: u8 {
        const ABOVE_GROUND = 1 << 0;
        const UNDERGROUND = 1 << 1;
        const PARTIALLY_UNDERWATER = 1 << 2;
        const UNDERWATER = 1 << 3;
    }
}

// ---------------------------------------------------------------------------
// Error text
// ---------------------------------------------------------------------------

/// User-facing reason a command failed. `Display` is the message shown.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorText {
    #[error("Raise or lower land first")]
    RaiseOrLowerLandFirst,
    #[error("{0} in the way")]
    InTheWay(String),
    #[error("Object in the way")]
    ObjectInTheWay,
    #[error("Cannot build partly above and partly below water")]
    CannotBuildPartlyAboveBelowWater,
    #[error("Another company is about to build here")]
    AnotherCompanyAboutToBuildHere,
    #[error("Off edge of map")]
    OffEdgeOfMap,
    #[error("Landscape data area full")]
    LandscapeDataAreaFull,
    #[error("Too low")]
    TooLow,
    #[error("Too high")]
    TooHigh,
    #[error("Cannot remove {0}")]
    CannotRemove(String),
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandContext {
    pub flags: CommandFlags,
    pub updating_company: CompanyId,
    pub error: Option<ErrorText>,
    pub position_flags: ElementPositionFlags,
    pub events: Vec<WorldEvent>,
}

impl CommandContext {
    pub fn new(flags: CommandFlags, updating_company: CompanyId) -> Self {
        Self {
            flags,
            updating_company,
            error: None,
            position_flags: ElementPositionFlags::empty(),
            events: Vec::new(),
        }
    }

    /// Query mode (price and validate only).
    pub fn query(updating_company: CompanyId) -> Self {
        Self::new(CommandFlags::empty(), updating_company)
    }

    pub fn apply(updating_company: CompanyId) -> Self {
        Self::new(CommandFlags::APPLY, updating_company)
    }

    pub fn set_error(&mut self, text: ErrorText) {
        self.error = Some(text);
    }

    /// Ghost commands leave no trace in the outside world.
    pub fn emit(&mut self, event: WorldEvent) {
        if !self.flags.is_ghost() {
            self.events.push(event);
        }
    }
}
