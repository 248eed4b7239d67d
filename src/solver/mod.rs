//! Solve orchestrator: the state machine that drives one challenge session
//! from checkbox click to terminal outcome.

mod strategy;

use crate::config::SolverConfig;
use crate::detect::{self, Signal};
use crate::driver::{selectors, AudioSolver, Frame, ImageSolver, WidgetDriver};
use crate::outcome::SolveOutcome;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Click budget for coaxing a checkbox that failed to render in time.
const SELF_HEAL_CLICKS: usize = 1;

/// Drives one challenge session. Owns the session exclusively for the
/// lifetime of the attempt: the page driver, the solving collaborators,
/// the timing policy, and the randomness source for human-mimicry steps.
/// No state survives across separate solve invocations; build a fresh
/// `Solver` per attempt.
pub struct Solver {
    driver: Arc<dyn WidgetDriver>,
    image: Arc<dyn ImageSolver>,
    audio: Arc<dyn AudioSolver>,
    config: SolverConfig,
    rng: StdRng,
}

impl Solver {
    pub fn new(
        driver: Arc<dyn WidgetDriver>,
        image: Arc<dyn ImageSolver>,
        audio: Arc<dyn AudioSolver>,
        config: SolverConfig,
    ) -> Self {
        Self::with_rng(driver, image, audio, config, StdRng::from_entropy())
    }

    /// Like [`Solver::new`] with an injected randomness source, so tests
    /// can pin the decoy-click behavior.
    pub fn with_rng(
        driver: Arc<dyn WidgetDriver>,
        image: Arc<dyn ImageSolver>,
        audio: Arc<dyn AudioSolver>,
        config: SolverConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            driver,
            image,
            audio,
            config,
            rng,
        }
    }

    /// Run one full solve attempt. Never fails: every fault inside the
    /// state machine is converted into a `failed` outcome, the whole
    /// attempt is bounded by the configured solve timeout, and elapsed
    /// time is attached before returning.
    pub async fn run(&mut self) -> SolveOutcome {
        let start = Instant::now();
        let timeout = self.config.solve_timeout();
        let mut outcome = match tokio::time::timeout(timeout, self.solve()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!("solve aborted: {}", e);
                SolveOutcome::failed(e.to_string())
            }
            Err(_) => {
                warn!("solve cancelled after {}ms", timeout.as_millis());
                SolveOutcome::failed(format!("solve timed out after {}ms", timeout.as_millis()))
            }
        };
        outcome.elapsed_ms = start.elapsed().as_millis() as u64;
        info!("result: {} ({}ms)", outcome.status, outcome.elapsed_ms);
        outcome
    }

    /// The solve state machine. Fatal conditions (missing frames, a
    /// checkbox that cannot be clicked, a missing strategy control)
    /// surface as errors; `run` turns them into a failed outcome.
    async fn solve(&mut self) -> Result<SolveOutcome> {
        self.driver.ensure_frame(Frame::Anchor).await?;
        self.driver.ensure_frame(Frame::Challenge).await?;

        info!("waiting for checkbox");
        self.wait_for_checkbox().await;
        info!("clicking checkbox");
        self.click_checkbox().await?;

        let signal = detect::check_detection(
            self.driver.as_ref(),
            self.config.animation_timeout(),
            self.config.poll_interval(),
        )
        .await;
        match signal {
            Signal::Solved => {
                info!("solved at the checkbox");
                Ok(self.finalize(SolveOutcome::success()).await)
            }
            Signal::Detected => {
                warn!("detection flagged after checkbox click");
                Ok(SolveOutcome::detected())
            }
            Signal::Pending => {
                info!("secondary challenge showing, escalating");
                let outcome = self.run_secondary().await?;
                if outcome.is_success() {
                    Ok(self.finalize(outcome).await)
                } else {
                    Ok(outcome)
                }
            }
        }
    }

    /// Poll for the checkbox anchor, bounded by the animation timeout.
    /// A polling fault or the window elapsing triggers at most
    /// [`SELF_HEAL_CLICKS`] stray clicks (some widgets only paint the
    /// anchor after one), then the flow proceeds best-effort.
    async fn wait_for_checkbox(&self) {
        let deadline = tokio::time::Instant::now() + self.config.animation_timeout();
        let mut heals = 0;
        loop {
            match self.driver.count(Frame::Anchor, selectors::CHECKBOX).await {
                Ok(n) if n > 0 => return,
                Ok(_) => {}
                Err(e) => {
                    debug!("checkbox poll failed: {}", e);
                    if heals < SELF_HEAL_CLICKS {
                        heals += 1;
                        self.self_heal_click().await;
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
        if heals < SELF_HEAL_CLICKS {
            debug!("checkbox not rendered in time");
            self.self_heal_click().await;
        }
    }

    async fn self_heal_click(&self) {
        if let Err(e) = self.click_checkbox().await {
            debug!("self-heal click failed: {}", e);
        }
    }

    /// Find the anchor control and click it. Without this control the
    /// solve cannot proceed, so any failure here is fatal.
    async fn click_checkbox(&self) -> Result<()> {
        self.driver
            .click(Frame::Anchor, selectors::CHECKBOX, 0)
            .await
            .map_err(|e| Error::Interaction(format!("checkbox click: {e}")))
    }

    /// Attach the page's proof token to a successful outcome. A failed or
    /// empty read keeps whatever the outcome already carries: token
    /// absence never downgrades a success.
    async fn finalize(&self, outcome: SolveOutcome) -> SolveOutcome {
        match self.extract_token().await {
            Ok(token) if !token.is_empty() => outcome.with_token(token),
            Ok(_) => outcome,
            Err(e) => {
                warn!("token extraction failed: {}", e);
                outcome
            }
        }
    }

    /// Current value of the page's proof-of-solve field, verbatim (may be
    /// empty). One read, no retries.
    pub async fn extract_token(&self) -> Result<String> {
        let value = self.driver.eval_page(detect::TOKEN_JS).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
