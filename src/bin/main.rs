use clap::Parser;
use nocap::live::EokaDriver;
use nocap::remote::RemoteSolver;
use nocap::{Config, Error, Solver, Status};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "nocap")]
#[command(about = "Automated challenge-widget solving")]
#[command(version)]
struct Cli {
    /// Config file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> nocap::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = Config::load(&cli.config)?;

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Strategy: {}", config.solver.strategy);
        println!(
            "  Animation timeout: {}ms",
            config.solver.animation_timeout_ms
        );
        println!("  Solve timeout: {}ms", config.solver.solve_timeout_ms);
        if config.solver.service.is_some() {
            println!("  Solving service: configured");
        }
        return Ok(());
    }

    // Override headless if specified
    if cli.headless {
        config.browser.headless = true;
    }

    let service = config
        .solver
        .service
        .clone()
        .ok_or_else(|| Error::Config("solver.service is required to run".into()))?;
    let sitekey = config
        .target
        .sitekey
        .clone()
        .ok_or_else(|| Error::Config("target.sitekey is required to run".into()))?;

    println!("Running: {}", config.name);

    let driver = Arc::new(EokaDriver::launch(&config.browser, &config.target.url).await?);
    let remote = Arc::new(RemoteSolver::new(
        service,
        config.target.url.clone(),
        sitekey,
        config.browser.proxy.clone(),
        config.browser.proxy_auth.clone(),
    ));

    let mut solver = Solver::new(
        driver.clone(),
        remote.clone(),
        remote,
        config.solver.clone(),
    );
    let outcome = solver.run().await;
    drop(solver);

    // Print result
    println!();
    match outcome.status {
        Status::Success => {
            println!("✓ Solved");
            if let Some(ref token) = outcome.token {
                println!("  Token: {}", token);
            }
        }
        Status::Detected => println!("✗ Detected"),
        Status::Failed => {
            println!("✗ Failed");
            if let Some(ref error) = outcome.error {
                println!("  Error: {}", error);
            }
        }
    }
    println!("  Duration: {}ms", outcome.elapsed_ms);

    if let Ok(driver) = Arc::try_unwrap(driver) {
        driver.close().await?;
    }

    if outcome.status != Status::Success {
        std::process::exit(1);
    }

    Ok(())
}
