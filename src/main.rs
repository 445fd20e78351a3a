//! HDR PredictK CLI
//!
//! Replays a simulated auto-exposure session through the PredictK engine
//! and prints the per-frame correction and stability decision.

use clap::Parser;
use hdr_predict::{
    capture::{OutputConfig, SessionFile, StatsSource, SyntheticSource},
    engine::PredictEngine,
    extraction::ExposureFrameCount,
    metrics::{MetricsRegistry, MetricsSnapshot},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Frame interval used in continuous mode.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Parser)]
#[command(name = "hdr-predict", version, about = "HDR PredictK replay tool")]
struct Args {
    /// Session file (TOML) with source, tuning and output settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to process.
    #[arg(short, long)]
    frames: Option<u32>,

    /// Exposures merged per frame (1, 2 or 3).
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
    exposure_frames: Option<u8>,

    /// Run until interrupted.
    #[arg(long)]
    continuous: bool,

    /// Metrics server port (0 to disable).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Print the Prometheus metrics text after the run.
    #[arg(long)]
    print_metrics: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("HDR PredictK v{}", hdr_predict::VERSION);

    let mut session = match &args.config {
        Some(path) => match SessionFile::from_file(path) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SessionFile::default(),
    };
    apply_overrides(&mut session, &args);

    let mut source = SyntheticSource::new();
    if let Err(e) = source.open(&session.source) {
        eprintln!("Failed to open statistics source: {}", e);
        std::process::exit(1);
    }

    let mut engine = PredictEngine::from_session(&session);

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let publisher = Publisher::start(registry, &session.output);

    let running = Arc::new(AtomicBool::new(true));
    if session.output.continuous {
        let flag = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    info!(
        frame_count = %session.source.exposure_frame_count,
        continuous = session.output.continuous,
        "Processing frames..."
    );

    let mut processed = 0u32;
    while running.load(Ordering::SeqCst)
        && (session.output.continuous || processed < session.output.frame_count)
    {
        let stats = match source.capture() {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Statistics capture failed: {}", e);
                break;
            }
        };

        let outcome = engine.process(&stats);
        println!(
            "{:>6} {:>7} {}",
            outcome.frame_id,
            outcome.predict_k,
            if outcome.stable { "stable" } else { "disturbed" }
        );

        publisher.publish(&MetricsSnapshot::from_engine(engine.stats()));
        processed += 1;

        if session.output.continuous {
            std::thread::sleep(FRAME_INTERVAL);
        }
    }

    source.close();

    let stats = engine.stats();
    info!(
        "Processed {} frames: {} applied, {} suppressed, {} degraded, {} stable",
        stats.frames,
        stats.applied,
        stats.suppressed_steady + stats.suppressed_swing,
        stats.degraded,
        stats.stable_frames
    );

    if args.print_metrics {
        match publisher.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }
}

fn apply_overrides(session: &mut SessionFile, args: &Args) {
    if let Some(frames) = args.frames {
        session.output.frame_count = frames;
    }
    if let Some(count) = args.exposure_frames {
        match ExposureFrameCount::try_from(count) {
            Ok(count) => session.source.exposure_frame_count = count,
            Err(e) => warn!("Ignoring --exposure-frames: {}", e),
        }
    }
    if args.continuous {
        session.output.continuous = true;
    }
    if let Some(port) = args.metrics_port {
        session.output.metrics_port = port;
    }
}

/// Pushes engine snapshots to the registry, through the HTTP server when enabled.
enum Publisher {
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served(Arc<tokio::sync::RwLock<hdr_predict::metrics::MetricsState>>),
}

impl Publisher {
    #[cfg(feature = "metrics")]
    fn start(registry: MetricsRegistry, output: &OutputConfig) -> Self {
        use hdr_predict::metrics::{MetricsServer, MetricsServerConfig};

        let Some(config) = MetricsServerConfig::from_output(output) else {
            return Self::Local(registry);
        };

        let server = MetricsServer::new(config, registry);
        let state = server.state();

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to start metrics runtime: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                warn!("Metrics server stopped: {}", e);
            }
        });

        Self::Served(state)
    }

    #[cfg(not(feature = "metrics"))]
    fn start(registry: MetricsRegistry, output: &OutputConfig) -> Self {
        if output.metrics_port != 0 {
            info!(
                port = output.metrics_port,
                "Metrics server disabled (build with --features metrics)"
            );
        }
        Self::Local(registry)
    }

    fn publish(&self, snapshot: &MetricsSnapshot) {
        match self {
            Self::Local(registry) => registry.update(snapshot),
            #[cfg(feature = "metrics")]
            Self::Served(state) => state.blocking_read().update(snapshot),
        }
    }

    fn encode(&self) -> Result<String, hdr_predict::metrics::MetricsError> {
        match self {
            Self::Local(registry) => registry.encode(),
            #[cfg(feature = "metrics")]
            Self::Served(state) => state.blocking_read().encode(),
        }
    }
}
