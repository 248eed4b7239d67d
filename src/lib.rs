//! # nocap
//!
//! Automated solving of interactive challenge widgets (reCAPTCHA v2 style).
//! Click the checkbox, watch for the widget's anti-automation verdict, and
//! fall back to an image or audio solving strategy when it escalates.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nocap::live::EokaDriver;
//! use nocap::remote::RemoteSolver;
//! use nocap::{Config, Solver};
//!
//! # #[tokio::main]
//! # async fn main() -> nocap::Result<()> {
//! let config = Config::load("solve.yaml")?;
//! let driver = Arc::new(EokaDriver::launch(&config.browser, &config.target.url).await?);
//!
//! let service = config.solver.service.clone().expect("solver.service configured");
//! let sitekey = config.target.sitekey.clone().unwrap_or_default();
//! let remote = Arc::new(RemoteSolver::new(
//!     service,
//!     config.target.url.clone(),
//!     sitekey,
//!     config.browser.proxy.clone(),
//!     config.browser.proxy_auth.clone(),
//! ));
//!
//! let mut solver = Solver::new(driver, remote.clone(), remote, config.solver.clone());
//! let outcome = solver.run().await;
//! println!("{}", outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detect;
pub mod driver;
pub mod live;
pub mod outcome;
pub mod remote;
pub mod solver;

pub use config::{BrowserConfig, Config, ProxyAuth, ServiceConfig, SolverConfig, Strategy};
pub use detect::{DetectionSignal, Signal};
pub use driver::{AudioSolver, Frame, ImageSolver, WidgetDriver};
pub use outcome::{SolveOutcome, Status};
pub use solver::Solver;

/// Result type for nocap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or a solve attempt.
///
/// `FrameMissing` and `Interaction` abort a solve during setup; a widget
/// without its frames or checkbox cannot be driven at all. `ControlMissing`
/// is fatal for the current strategy path only; there is no cross-strategy
/// fallback. Everything else is an unexpected session fault; `Solver::run`
/// converts all of these into a `failed` outcome rather than letting them
/// escape to the caller. Detection is not an error, and neither is a bounded
/// wait elapsing without a signal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not locate the {0} frame")]
    FrameMissing(Frame),

    #[error("{0} missing")]
    ControlMissing(&'static str),

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("solver service error: {0}")]
    Service(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
