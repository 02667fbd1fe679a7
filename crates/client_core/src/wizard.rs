//! Stage controller for the county ballot audit wizard.
//!
//! ```text
//! List --advance--> BallotAudit --advance--> Review --advance--> BallotAudit
//! List <--retreat-- BallotAudit <--retreat-- Review
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStage {
    #[default]
    List,
    BallotAudit,
    Review,
}

impl WizardStage {
    /// Forward table. Review loops back to BallotAudit so the board can keep
    /// auditing until round completion replaces the wizard.
    pub fn advance(self) -> WizardStage {
        match self {
            Self::List => Self::BallotAudit,
            Self::BallotAudit => Self::Review,
            Self::Review => Self::BallotAudit,
        }
    }

    /// Backward table. `List` is the entry stage and has no predecessor.
    pub fn retreat(self) -> Option<WizardStage> {
        match self {
            Self::List => None,
            Self::BallotAudit => Some(Self::List),
            Self::Review => Some(Self::BallotAudit),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::BallotAudit => "ballot-audit",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the scroll reset that accompanies every stage change.
pub trait Viewport {
    fn scroll_to_top(&mut self);
}

/// Viewport for headless callers.
#[derive(Debug, Default)]
pub struct NoopViewport;

impl Viewport for NoopViewport {
    fn scroll_to_top(&mut self) {}
}

pub struct WizardController<V: Viewport = NoopViewport> {
    stage: WizardStage,
    viewport: V,
}

impl WizardController<NoopViewport> {
    pub fn new() -> Self {
        Self::with_viewport(NoopViewport)
    }
}

impl Default for WizardController<NoopViewport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Viewport> WizardController<V> {
    pub fn with_viewport(viewport: V) -> Self {
        Self {
            stage: WizardStage::List,
            viewport,
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn advance(&mut self) -> WizardStage {
        let next = self.stage.advance();
        self.enter(next);
        next
    }

    /// Fails without touching the stage or the viewport when the current
    /// stage has no backward entry.
    pub fn retreat(&mut self) -> Result<WizardStage, WizardError> {
        let prev = self
            .stage
            .retreat()
            .ok_or(WizardError::NoTransition { from: self.stage })?;
        self.enter(prev);
        Ok(prev)
    }

    fn enter(&mut self, stage: WizardStage) {
        debug!(from = %self.stage, to = %stage, "wizard: stage transition");
        self.stage = stage;
        self.viewport.scroll_to_top();
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
