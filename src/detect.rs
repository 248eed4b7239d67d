//! Detection monitor: bounded polling for the widget's terminal signals.

use crate::driver::{Frame, WidgetDriver};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Snapshot of the widget's terminal indicators, recomputed on every poll
/// and never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionSignal {
    /// The widget flagged the session as automated.
    pub detected: bool,
    /// The proof-of-solve field carries a non-empty value.
    pub token_present: bool,
}

/// Outcome of one bounded detection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Proof token observed: the widget is satisfied.
    Solved,
    /// Anti-automation verdict observed: stop interacting.
    Detected,
    /// The window elapsed with neither signal. Callers decide what that
    /// means at their step: usually "a harder challenge is now showing".
    Pending,
}

/// Challenge-frame probe for the anti-automation verdict.
const DETECTED_JS: &str = "(() => { \
    if (d.querySelector('.rc-doscaptcha-header')) return true; \
    const text = d.body ? d.body.innerText : ''; \
    return text.indexOf('Try again later') !== -1 \
        || text.indexOf('automated queries') !== -1; \
})()";

/// Top-document read of the proof-of-solve field, verbatim.
pub(crate) const TOKEN_JS: &str = "(() => { \
    const el = document.getElementById('g-recaptcha-response'); \
    return el ? el.value : ''; \
})()";

/// Read the current detection snapshot. A probe fault is treated as
/// no-signal: the frame being probed may simply still be rendering.
pub async fn read_signal(driver: &dyn WidgetDriver) -> DetectionSignal {
    let detected = match driver.eval(Frame::Challenge, DETECTED_JS).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            debug!("detection probe failed: {}", e);
            false
        }
    };
    let token_present = match driver.eval_page(TOKEN_JS).await {
        Ok(value) => value.as_str().map(|s| !s.is_empty()).unwrap_or(false),
        Err(e) => {
            debug!("token probe failed: {}", e);
            false
        }
    };
    DetectionSignal {
        detected,
        token_present,
    }
}

/// Poll at a fixed cadence until a terminal signal appears or `timeout`
/// elapses. The token read wins over the detection flag within a single
/// snapshot: a present proof token means the page's own submission logic
/// will accept the solve.
pub async fn check_detection(
    driver: &dyn WidgetDriver,
    timeout: Duration,
    poll: Duration,
) -> Signal {
    let deadline = Instant::now() + timeout;
    loop {
        let signal = read_signal(driver).await;
        if signal.token_present {
            return Signal::Solved;
        }
        if signal.detected {
            return Signal::Detected;
        }
        if Instant::now() >= deadline {
            return Signal::Pending;
        }
        tokio::time::sleep(poll).await;
    }
}
