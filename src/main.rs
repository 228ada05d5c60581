//! Flick feed service
//!
//! Listens for a launcher on a Unix socket and runs the feed overlay on
//! a single control thread.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_feed::bridge::{ControlLoop, FeedServer, HeadlessHost, LauncherFeed};
use flick_feed::config::FeedConfig;
use flick_feed::feed::FeedController;
use flick_feed::input::SwipeDetector;

#[derive(Parser, Debug)]
#[command(name = "flick-feed")]
#[command(about = "Feed overlay service for the Flick launcher", long_about = None)]
struct Args {
    /// Config file (default: ~/.config/flick/feed.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket path, overrides the config
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Drag distance for a full open/close in px, overrides the config
    #[arg(long)]
    extent: Option<f32>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Log panics to the crash log before dying
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(home) = std::env::var("HOME") {
            let crash_log = format!("{}/.local/state/flick/feed-crash.log", home);
            if let Ok(mut f) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                use std::io::Write;
                let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
            }
        }
    }));

    // ~/.local/state/flick or /tmp/flick
    let log_dir = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick");

    std::fs::create_dir_all(&log_dir).ok();

    let args = Args::parse();

    let file_appender = rolling::daily(&log_dir, "feed.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if args.debug {
        "debug,flick_feed=debug"
    } else {
        "warn,flick_feed=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(log_path = %log_dir.display(), "Flick feed starting");

    let mut config = FeedConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(socket) = args.socket {
        config.socket_path = Some(socket);
    }
    if let Some(extent) = args.extent {
        if extent > 0.0 {
            config.reference_extent = extent;
        } else {
            warn!(extent, "Ignoring non-positive --extent");
        }
    }

    let detector = SwipeDetector::new(config.swipe_config());
    let controller = FeedController::new(detector, config.reference_extent)
        .with_settle_duration(config.close_duration());
    let feed = LauncherFeed::new(controller, Box::new(HeadlessHost::new()), config.rebind_policy);

    let (mut control, handle) =
        ControlLoop::new(feed, config.frame_interval()).context("Failed to create control loop")?;

    let socket_path = config.socket_path();
    let server = FeedServer::bind(&socket_path, handle)
        .with_context(|| format!("Failed to bind {}", socket_path.display()))?;
    server.spawn().context("Failed to start socket server")?;

    control.run().context("Control loop failed")?;
    info!("Flick feed exiting");
    Ok(())
}
