//! Collaborator boundary: page control and the two secondary-challenge
//! solvers. The orchestrator only ever talks to these traits; live runs
//! plug in the browser-backed driver from [`crate::live`], tests plug in
//! scripted mocks.

use crate::outcome::SolveOutcome;
use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// Which widget iframe an operation targets.
///
/// Frames are resolved by the driver on every call, never cached, so a
/// widget reload between waits cannot leave the orchestrator acting on a
/// detached handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// The top-level frame carrying the checkbox anchor.
    Anchor,
    /// The frame carrying the image grid and audio controls.
    Challenge,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Anchor => f.write_str("anchor"),
            Frame::Challenge => f.write_str("challenge"),
        }
    }
}

/// Widget selectors.
pub mod selectors {
    pub const ANCHOR_FRAME: &str = "iframe[src*='api2/anchor']";
    pub const CHALLENGE_FRAME: &str = "iframe[src*='api2/bframe']";
    pub const CHECKBOX: &str = "#recaptcha-anchor";
    pub const AUDIO_BUTTON: &str = "#recaptcha-audio-button";
    pub const IMAGE_TILE: &str = ".rc-imageselect-tile";
    pub const TOKEN_FIELD: &str = "#g-recaptcha-response";
}

/// Page-control primitives consumed by the solve state machine.
#[async_trait]
pub trait WidgetDriver: Send + Sync {
    /// Resolve the iframe for `frame`, failing with
    /// [`Error::FrameMissing`](crate::Error::FrameMissing) if the widget
    /// does not expose it.
    async fn ensure_frame(&self, frame: Frame) -> Result<()>;

    /// Number of elements currently matching `selector` inside `frame`.
    async fn count(&self, frame: Frame, selector: &str) -> Result<usize>;

    /// Click the `index`-th element matching `selector` inside `frame`.
    /// Fails if the element is absent or not clickable.
    async fn click(&self, frame: Frame, selector: &str, index: usize) -> Result<()>;

    /// Evaluate a JS expression inside `frame` and return its JSON value.
    /// The frame's document is in scope as `d`; a `null` result means the
    /// frame was not reachable.
    async fn eval(&self, frame: Frame, script: &str) -> Result<serde_json::Value>;

    /// Evaluate a JS expression in the top-level document.
    async fn eval_page(&self, script: &str) -> Result<serde_json::Value>;
}

/// Visual-grid solving collaborator. Grid discovery and tile
/// classification are entirely its concern: when the widget never offers
/// an image grid, the collaborator reports a failed outcome and the solve
/// ends there (bounded by the overall solve timeout) instead of hanging.
#[async_trait]
pub trait ImageSolver: Send + Sync {
    async fn solve_by_image(&self) -> Result<SolveOutcome>;
}

/// Audio-transcription solving collaborator. Invoked only after the
/// orchestrator has surfaced the audio challenge and cleared the
/// post-click detection checkpoint.
#[async_trait]
pub trait AudioSolver: Send + Sync {
    async fn solve_by_audio(&self) -> Result<SolveOutcome>;
}
