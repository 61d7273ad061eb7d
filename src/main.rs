//! MargaSLAM - Pose-graph front end for a spinning-lidar mapping pipeline
//!
//! Daemon wiring:
//! - **Tracker thread**: ingests localization samples and sweeps, keeps the
//!   raw and drift-corrected pose streams
//! - **Builder thread**: polls estimate snapshots at a fixed rate and grows
//!   the pose graph (keyframes, plain vertices, refinement window)
//! - **Scenario source**: deterministic synthetic trajectory standing in for
//!   live hardware
//!
//! # Usage
//!
//! ```bash
//! # With default config
//! cargo run --release
//!
//! # With custom config file
//! cargo run --release -- --config marga-slam.toml
//! ```

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use marga_slam::{
    BuilderConfig, BuilderThread, GraphBuilder, LogSink, OdometryTracker, PoseGraph,
    RegistrationParams, ScenarioConfig, ScenarioEvent, StaticFrameResolver, TrackerConfig,
    TrackerThread, VoxelGridConfig, VoxelGridDownsampler,
};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct Config {
    #[serde(default)]
    frames: FramesConfig,
    #[serde(default)]
    tracker: TrackerCfg,
    #[serde(default)]
    registration: RegistrationCfg,
    #[serde(default)]
    preprocessing: PreprocessingConfig,
    #[serde(default)]
    builder: BuilderCfg,
    #[serde(default)]
    scenario: ScenarioCfg,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FramesConfig {
    map: String,
    odom: String,
    robot: String,
    sensor: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            map: "map".to_string(),
            odom: "odom".to_string(),
            robot: "base_link".to_string(),
            sensor: "laser".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackerCfg {
    /// Minimum position delta before a localization sample is accepted (m).
    pose_dist_thresh: f64,
    /// Sweeps between reference-sweep replacements.
    num_clouds_skip: u32,
    /// Verbosity: 0 silent, 1 pose/debug streams, 2 diagnostics.
    verbosity: u8,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            pose_dist_thresh: 0.05,
            num_clouds_skip: 2,
            verbosity: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RegistrationCfg {
    max_iterations: u32,
    epsilon: f64,
    max_correspondence_distance: f64,
}

impl Default for RegistrationCfg {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            epsilon: 1e-6,
            max_correspondence_distance: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PreprocessingConfig {
    /// Voxel edge length for sweep downsampling (m).
    leaf_size: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self { leaf_size: 0.05 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BuilderCfg {
    /// Travel distance that promotes a vertex to a keyframe (m).
    kfs_dist_thresh: f64,
    /// Raw displacement that forces a fallback vertex (m).
    vertex_dist_thresh: f64,
    /// Keyframe count between refinement requests.
    keyframes_window: u64,
}

impl Default for BuilderCfg {
    fn default() -> Self {
        Self {
            kfs_dist_thresh: 0.3,
            vertex_dist_thresh: 0.05,
            keyframes_window: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScenarioCfg {
    num_samples: usize,
    sample_period_us: u64,
    step_translation: f64,
    step_yaw: f64,
    odom_noise: f64,
    sweep_every: usize,
    points_per_sweep: usize,
    room_radius: f64,
    seed: u64,
}

impl Default for ScenarioCfg {
    fn default() -> Self {
        let d = ScenarioConfig::default();
        Self {
            num_samples: d.num_samples,
            sample_period_us: d.sample_period_us,
            step_translation: d.step_translation,
            step_yaw: d.step_yaw,
            odom_noise: d.odom_noise,
            sweep_every: d.sweep_every,
            points_per_sweep: d.points_per_sweep,
            room_radius: d.room_radius,
            seed: d.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RuntimeConfig {
    /// Builder tick period (ms).
    tick_period_ms: u64,
    /// Delay between replayed scenario events (ms).
    playback_delay_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 20,
            playback_delay_ms: 2,
        }
    }
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: basic_toml::Error,
    },
}

fn read_config(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    basic_toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

fn load_config(args: &Args) -> Config {
    match &args.config_path {
        Some(path) => match read_config(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path);
                cfg
            }
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Config::default()
            }
        },
        None => {
            // Try default paths
            for path in &["marga-slam.toml", "/etc/marga-slam.toml"] {
                if let Ok(cfg) = read_config(path) {
                    log::info!("Loaded config from {}", path);
                    return cfg;
                }
            }
            Config::default()
        }
    }
}

// ============================================================================
// CLI Arguments
// ============================================================================

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("marga-slam - pose-graph front end for a spinning-lidar pipeline");
    println!();
    println!("USAGE:");
    println!("    marga-slam [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: marga-slam.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [tracker] pose_dist_thresh, num_clouds_skip, verbosity");
    println!("    - [builder] kfs_dist_thresh, vertex_dist_thresh, keyframes_window");
    println!("    - [scenario] synthetic trajectory parameters");
    println!();
    println!("THREADS:");
    println!("    The daemon runs with 2 fixed threads:");
    println!("    - Tracker Thread: localization samples and sweep registration");
    println!("    - Builder Thread: fixed-rate pose-graph construction");
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = load_config(&args);

    log::info!("marga-slam starting");
    log::info!(
        "  Frames: {} <- {} <- {} <- {}",
        config.frames.map,
        config.frames.odom,
        config.frames.robot,
        config.frames.sensor
    );
    log::info!(
        "  Tracker: pose_dist_thresh={}m, num_clouds_skip={}",
        config.tracker.pose_dist_thresh,
        config.tracker.num_clouds_skip
    );
    log::info!(
        "  Builder: kfs={}m, vertex={}m, window={}",
        config.builder.kfs_dist_thresh,
        config.builder.vertex_dist_thresh,
        config.builder.keyframes_window
    );
    log::info!(
        "  Scenario: {} samples, sweep every {}",
        config.scenario.num_samples,
        config.scenario.sweep_every
    );

    // Setup signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");

    run_daemon(&config, running);

    log::info!("marga-slam shutdown complete");
}

// ============================================================================
// Multi-Threaded Daemon
// ============================================================================

fn run_daemon(config: &Config, running: Arc<AtomicBool>) {
    log::info!("Initializing daemon...");

    let scenario_config = ScenarioConfig {
        num_samples: config.scenario.num_samples,
        sample_period_us: config.scenario.sample_period_us,
        step_translation: config.scenario.step_translation,
        step_yaw: config.scenario.step_yaw,
        odom_noise: config.scenario.odom_noise,
        sweep_every: config.scenario.sweep_every,
        points_per_sweep: config.scenario.points_per_sweep,
        room_radius: config.scenario.room_radius,
        seed: config.scenario.seed,
    };
    let scenario = marga_slam::io::sim::generate(&scenario_config);
    log::info!("  Scenario generated ({} events)", scenario.events.len());

    let sink = Arc::new(LogSink::new(config.tracker.verbosity));

    let tracker_config = TrackerConfig {
        map_frame: config.frames.map.clone(),
        odom_frame: config.frames.odom.clone(),
        robot_frame: config.frames.robot.clone(),
        sensor_frame: config.frames.sensor.clone(),
        pose_dist_thresh: config.tracker.pose_dist_thresh,
        num_clouds_skip: config.tracker.num_clouds_skip,
        registration: RegistrationParams {
            max_iterations: config.registration.max_iterations,
            epsilon: config.registration.epsilon,
            max_correspondence_distance: config.registration.max_correspondence_distance,
        },
        verbosity: config.tracker.verbosity,
    };
    let tracker = OdometryTracker::new(
        tracker_config,
        Box::new(StaticFrameResolver::identity()),
        Box::new(scenario.oracle),
        Box::new(VoxelGridDownsampler::new(VoxelGridConfig {
            leaf_size: config.preprocessing.leaf_size,
        })),
        sink.clone(),
    );
    let shared_tracker: marga_slam::SharedTracker = Arc::new(parking_lot::Mutex::new(tracker));

    let graph = PoseGraph::new(sink);
    let builder = GraphBuilder::new(
        BuilderConfig {
            kfs_dist_thresh: config.builder.kfs_dist_thresh,
            vertex_dist_thresh: config.builder.vertex_dist_thresh,
            keyframes_window: config.builder.keyframes_window,
        },
        Box::new(graph),
    );

    // Spawn threads
    log::info!("Spawning threads...");

    let (sample_tx, sample_rx) = crossbeam_channel::unbounded();
    let (sweep_tx, sweep_rx) = crossbeam_channel::unbounded();

    let tracker_thread =
        TrackerThread::spawn(shared_tracker.clone(), sample_rx, sweep_rx, running.clone());
    log::info!("  Tracker thread started");

    let builder_thread = BuilderThread::spawn(
        builder,
        shared_tracker.clone(),
        config.runtime.tick_period_ms,
        running.clone(),
    );
    log::info!(
        "  Builder thread started ({}ms period)",
        config.runtime.tick_period_ms
    );

    // Replay the scenario into the ingest channels.
    for event in scenario.events {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        let disconnected = match event {
            ScenarioEvent::Odometry(sample) => sample_tx.send(sample).is_err(),
            ScenarioEvent::Sweep(sweep) => sweep_tx.send(sweep).is_err(),
        };
        if disconnected {
            break;
        }
        std::thread::sleep(Duration::from_millis(config.runtime.playback_delay_ms));
    }
    log::info!("Scenario replay finished");

    // Hang up so the tracker thread drains and exits, give the builder a few
    // more ticks to consume the final snapshot, then stop everything.
    drop(sample_tx);
    drop(sweep_tx);
    if let Err(e) = tracker_thread.join() {
        log::error!("Tracker thread panicked: {:?}", e);
    }
    std::thread::sleep(Duration::from_millis(config.runtime.tick_period_ms * 3));
    running.store(false, Ordering::Relaxed);

    match builder_thread.join() {
        Ok(builder) => log::info!(
            "Final graph: {} vertices, {} keyframes",
            builder.num_vertices(),
            builder.num_keyframes()
        ),
        Err(e) => log::error!("Builder thread panicked: {:?}", e),
    }

    {
        let tracker = shared_tracker.lock();
        log::info!(
            "Final trajectory: {} raw poses, {} corrected poses",
            tracker.raw_path().len(),
            tracker.corrected_path().len()
        );
        if let Some(pose) = tracker.corrected_path().last() {
            log::info!("Final corrected position: {:?}", pose.position);
        }
    }

    log::info!("All threads stopped");
}
