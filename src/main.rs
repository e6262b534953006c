use anyhow::Result;
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use repcam::{
    load_session_plan, score_session, JsonlPoseSource, RepcamConfig, SessionReport, SessionTracker,
    WorkoutScore,
};

#[derive(Parser, Debug)]
#[command(name = "repcam")]
#[command(about = "Workout video analysis: count exercise repetitions from recorded pose landmarks")]
#[command(version)]
#[command(long_about = "Counts repetitions (and hold durations) of push-ups, squats, pull-ups, \
planks and lunges from a recorded pose-landmark stream, using caller-declared time windows to \
decide which exercise each frame belongs to. Produces a JSON statistics report, optionally \
scored against a built-in workout plan.")]
struct Args {
    /// Recorded landmark stream (JSONL, one detection or null per frame)
    #[arg(value_name = "LANDMARKS", help = "Path to the recorded landmark stream (JSONL)")]
    landmarks: Option<PathBuf>,

    /// Session plan file declaring fps and exercise intervals
    #[arg(value_name = "SESSION", help = "Path to the session plan (TOML or JSON)")]
    session: Option<PathBuf>,

    /// Score the session against a built-in workout plan
    #[arg(short, long, value_name = "PLAN", help = "Workout plan to score against \
(beginner, classic, full-body, strength, legs-and-core)")]
    plan: Option<String>,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long, value_name = "FILE", help = "Write the JSON report to this file")]
    output: Option<PathBuf>,

    /// Write per-frame overlay annotations (active exercise + landmarks) as JSONL
    #[arg(long, value_name = "FILE", help = "Write per-frame overlay annotations to this file")]
    annotations: Option<PathBuf>,

    /// Run the HTTP analysis service instead of processing files
    #[cfg(feature = "service")]
    #[arg(long, help = "Run the HTTP analysis service")]
    serve: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "repcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without processing")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config();
        return Ok(());
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Starting repcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    // Load and validate configuration
    let config = match RepcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Validate configuration if requested
    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    #[cfg(feature = "service")]
    if args.serve {
        let server = repcam::AnalyzeServer::new(config.service.clone());
        return server.start().await.map_err(Into::into);
    }

    let (landmarks, session) = match (&args.landmarks, &args.session) {
        (Some(landmarks), Some(session)) => (landmarks, session),
        _ => {
            eprintln!("✗ Both a landmark stream and a session plan are required (see --help)");
            std::process::exit(2);
        }
    };

    let (report, score) = analyze_files(
        landmarks,
        session,
        args.plan.as_deref(),
        args.annotations.as_deref(),
    )?;

    let mut rendered = serde_json::to_value(&report)?;
    if let Some(ref score) = score {
        rendered["score"] = serde_json::to_value(score)?;
    }

    let json = if config.report.pretty {
        serde_json::to_string_pretty(&rendered)?
    } else {
        serde_json::to_string(&rendered)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(score) = score {
        eprintln!(
            "✓ Plan '{}' completed at {:.0}%, grade {}",
            score.plan, score.overall_percent, score.grade
        );
    }

    Ok(())
}

/// Run one full analysis pass over a recorded landmark stream.
fn analyze_files(
    landmarks: &Path,
    session: &Path,
    plan_name: Option<&str>,
    annotations: Option<&Path>,
) -> Result<(SessionReport, Option<WorkoutScore>)> {
    let plan = load_session_plan(session)?;
    let mut source = JsonlPoseSource::open(landmarks)?;
    let mut tracker = SessionTracker::new(&plan)?;

    let mut annotation_sink = match annotations {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    while let Some(observation) = source.next_observation()? {
        let annotation = tracker.process_frame(observation.landmarks());
        if let Some(sink) = annotation_sink.as_mut() {
            serde_json::to_writer(&mut *sink, &annotation)?;
            sink.write_all(b"\n")?;
        }
    }

    if let Some(mut sink) = annotation_sink {
        sink.flush()?;
    }

    let report = tracker.finish();
    let score = match plan_name {
        Some(name) => Some(score_session(name, &report)?),
        None => None,
    };

    Ok((report, score))
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repcam={}", log_level)));

    // Configure format based on options
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# Repcam Configuration File");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[service]
# IP address to bind to
ip = "0.0.0.0"
# Port to listen on
port = 5000

[report]
# Pretty-print JSON reports
pretty = true
"#;

    println!("{}", default_config);
}
