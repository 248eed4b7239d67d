//! Strategy selector: drives the pre-invocation UI steps for the
//! configured secondary-challenge strategy and delegates to the external
//! solving collaborator.

use super::Solver;
use crate::config::Strategy;
use crate::detect::{self, Signal};
use crate::driver::{selectors, AudioSolver, Frame, ImageSolver};
use crate::outcome::SolveOutcome;
use crate::{Error, Result};
use rand::Rng;
use std::ops::Range;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Decoy tile clicks per audio attempt. The upper bound is exclusive: the
/// effective count is uniform over {3, 4, 5}.
const DECOY_CLICKS: Range<u32> = 3..6;

/// Randomized pause between the decoy clicks and the audio button, in
/// milliseconds.
const DECOY_PAUSE_MS: Range<u64> = 1000..2000;

impl Solver {
    /// Run exactly one secondary-challenge attempt with the configured
    /// strategy and adopt its outcome verbatim. The strategy is a fixed
    /// choice per solve: a missing control fails this attempt rather than
    /// falling back to the other strategy.
    pub(super) async fn run_secondary(&mut self) -> Result<SolveOutcome> {
        match self.config.strategy {
            Strategy::Images => {
                info!("using image solver");
                self.image.solve_by_image().await
            }
            Strategy::Audio => self.run_audio().await,
        }
    }

    async fn run_audio(&mut self) -> Result<SolveOutcome> {
        info!("using audio solver");
        self.wait_for_audio_button().await?;

        let decoys = self.rng.gen_range(DECOY_CLICKS);
        debug!("performing {} decoy clicks", decoys);
        for _ in 0..decoys {
            self.click_decoy_tile().await;
        }
        let pause = Duration::from_millis(self.rng.gen_range(DECOY_PAUSE_MS));
        debug!("pausing {}ms before the audio button", pause.as_millis());
        tokio::time::sleep(pause).await;

        info!("clicking audio button");
        self.driver
            .click(Frame::Challenge, selectors::AUDIO_BUTTON, 0)
            .await
            .map_err(|e| Error::Interaction(format!("audio button click: {e}")))?;

        let signal = detect::check_detection(
            self.driver.as_ref(),
            self.config.animation_timeout(),
            self.config.poll_interval(),
        )
        .await;
        if signal == Signal::Detected {
            warn!("detection flagged after audio button click");
            return Ok(SolveOutcome::detected());
        }

        self.audio.solve_by_audio().await
    }

    /// Wait for the audio challenge entry control to render. Its absence
    /// is fatal for the audio path.
    async fn wait_for_audio_button(&self) -> Result<()> {
        debug!("waiting for audio button");
        let deadline = Instant::now() + self.config.animation_timeout();
        loop {
            match self
                .driver
                .count(Frame::Challenge, selectors::AUDIO_BUTTON)
                .await
            {
                Ok(n) if n > 0 => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!("audio button poll failed: {}", e),
            }
            if Instant::now() >= deadline {
                return Err(Error::ControlMissing("audio button"));
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Click one uniformly random visible tile. Mimicry, not a solving
    /// step: a missing grid or a failed click skips the decoy instead of
    /// failing the attempt.
    async fn click_decoy_tile(&mut self) {
        let tiles = match self
            .driver
            .count(Frame::Challenge, selectors::IMAGE_TILE)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                debug!("tile probe failed: {}", e);
                0
            }
        };
        if tiles == 0 {
            debug!("no tiles visible, skipping decoy click");
            return;
        }
        let pick = self.rng.gen_range(0..tiles);
        debug!("decoy click on tile {}/{}", pick + 1, tiles);
        if let Err(e) = self
            .driver
            .click(Frame::Challenge, selectors::IMAGE_TILE, pick)
            .await
        {
            debug!("decoy click failed: {}", e);
        }
    }
}
