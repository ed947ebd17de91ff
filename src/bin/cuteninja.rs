#[macro_use]
extern crate log;

/// A default 'anyhow' based result type
type Result<T> = anyhow::Result<T>;

use anyhow::{anyhow, Context};
use clap::Parser;
use cuteninja::{config::DEFAULT_MAX_DEPTH, Config, GeometrySink, WindowTracker, XcbConnection};
use simplelog::{LevelFilter, SimpleLogger, WriteLogger};
use std::{fs::File, path::PathBuf, sync::mpsc, thread};

/// Follow the active X11 window and report where it is on screen
#[derive(Parser, Debug)]
#[command(name = "cuteninja", version)]
struct Args {
    /// X display to connect to (defaults to $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Give up on parent chains deeper than this
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Only rely on root window notifications to see the active window move
    #[arg(long)]
    no_watch_ancestors: bool,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    /// Log to this file instead of the terminal
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the active window as "x y width height id" and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            display: self.display.clone(),
            max_depth: self.max_depth,
            watch_ancestors: !self.no_watch_ancestors,
            log_level: self.log_level,
            log_file: self.log_file.clone(),
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Unable to create log file {}", path.display()))?;
            WriteLogger::init(config.log_level, simplelog::Config::default(), file)?;
        }
        None => SimpleLogger::init(config.log_level, simplelog::Config::default())?,
    }
    Ok(())
}

fn print_once(config: &Config) -> Result<()> {
    let conn = XcbConnection::new(config.display.as_deref())?;
    let mut tracker = WindowTracker::new(&conn, config);
    let geometry = tracker.resolve().context("Unable to resolve the active window")?;
    println!(
        "{} {} {} {} {}",
        geometry.x, geometry.y, geometry.width, geometry.height, geometry.id
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    // -- logging --
    init_logging(&config)?;
    info!("Cute Ninja startup");

    if args.once {
        return print_once(&config);
    }

    // Stand-in for the overlay: it only needs to hear about the fields that changed
    let sink = GeometrySink::new();
    sink.subscribe(|change| info!("active window {} -> {}", change.field, change.value));

    let (tx, rx) = mpsc::channel();
    let monitor_config = config.clone();
    let monitor = thread::Builder::new()
        .name("active-window-monitor".to_string())
        .spawn(move || -> Result<()> {
            let conn = XcbConnection::new(monitor_config.display.as_deref())?;
            let mut tracker = WindowTracker::new(&conn, &monitor_config);
            tracker.start(|geometry| {
                // The receiver only goes away once main is on its way out
                let _ = tx.send(geometry);
            })?;
            Ok(())
        })
        .context("Failed to spawn the active window monitor")?;

    // Geometries arrive in event order; the sink is only touched from this thread
    for geometry in rx {
        sink.apply(&geometry);
    }

    let result = match monitor.join() {
        Ok(result) => result.context("Active window monitor stopped"),
        Err(_) => Err(anyhow!("Active window monitor panicked")),
    };
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
