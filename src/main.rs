use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use satpass::config::Config;
use satpass::dispatch::{self, Dispatcher, JobKind, JobRequest, JobResponse, JobResult};
use satpass::predict::GroundStation;
use satpass::tle::TleRecord;
use satpass::PredictionEngine;

#[derive(Parser)]
#[command(name = "satpass")]
#[command(about = "Satellite pass prediction and eclipse classification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict visibility passes for the satellites in a TLE file
    Passes {
        /// TLE file or directory of .tle/.txt files
        tle: PathBuf,
        /// YAML config with station coordinates and search defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Station as "lat, lon" in degrees (overrides the config)
        #[arg(long)]
        coordinates: Option<String>,
        /// Station altitude in meters
        #[arg(long, default_value_t = 0.0)]
        altitude_m: f64,
        /// Search window length, e.g. "6h", "14d"
        #[arg(long, default_value = "24h")]
        window: String,
        /// Minimum elevation in degrees
        #[arg(long)]
        min_elevation: Option<f64>,
        /// Stop after this many passes per satellite
        #[arg(long)]
        max_passes: Option<usize>,
        /// Use ground-track swath membership of this width instead of elevation
        #[arg(long)]
        swath_km: Option<f64>,
        /// Background workers; 0 runs on the calling thread
        #[arg(long, default_value_t = 0)]
        workers: usize,
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Print the per-search timing breakdown
        #[arg(long)]
        stats: bool,
    },
    /// Print the current geodetic subpoint of each satellite
    Position {
        /// TLE file or directory
        tle: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Passes {
            tle,
            config,
            coordinates,
            altitude_m,
            window,
            min_elevation,
            max_passes,
            swath_km,
            workers,
            json,
            stats,
        } => run_passes(PassArgs {
            tle,
            config,
            coordinates,
            altitude_m,
            window,
            min_elevation,
            max_passes,
            swath_km,
            workers,
            json,
            stats,
        }),
        Commands::Position { tle } => run_position(&tle),
    }
}

struct PassArgs {
    tle: PathBuf,
    config: Option<PathBuf>,
    coordinates: Option<String>,
    altitude_m: f64,
    window: String,
    min_elevation: Option<f64>,
    max_passes: Option<usize>,
    swath_km: Option<f64>,
    workers: usize,
    json: bool,
    stats: bool,
}

fn run_passes(args: PassArgs) -> ExitCode {
    let config = match args.config.as_deref().map(Config::from_path) {
        Some(Ok(config)) => Some(config),
        Some(Err(e)) => {
            eprintln!("Error reading config: {e}");
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let station = match resolve_station(&args, config.as_ref()) {
        Some(station) => station,
        None => {
            eprintln!("No ground station: pass --coordinates \"lat, lon\" or --config");
            return ExitCode::FAILURE;
        }
    };

    let window = match humantime::parse_duration(&args.window)
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
    {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Invalid window: {e}");
            return ExitCode::FAILURE;
        }
    };

    let records = match satpass::tle::load(&args.tle) {
        Ok(records) if !records.is_empty() => records,
        Ok(_) => {
            eprintln!("No satellites found in {}", args.tle.display());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error loading TLEs: {e}");
            return ExitCode::FAILURE;
        }
    };

    let defaults = config.map(|c| c.search).unwrap_or_default();
    let min_elevation = args.min_elevation.unwrap_or(defaults.min_elevation_deg);
    let max_passes = args.max_passes.unwrap_or(defaults.max_passes);

    let start = Utc::now();
    let end = start + window;
    let requests: Vec<JobRequest> = records
        .iter()
        .enumerate()
        .map(|(i, record)| JobRequest {
            id: i as u64 + 1,
            kind: match args.swath_km {
                Some(swath_km) => JobKind::ComputePassesSwath {
                    tle: record.text.clone(),
                    station,
                    swath_km,
                    start_ms: start.timestamp_millis(),
                    end_ms: end.timestamp_millis(),
                    max_passes,
                    collect_stats: args.stats,
                },
                None => JobKind::ComputePassesElevation {
                    tle: record.text.clone(),
                    station,
                    start_ms: start.timestamp_millis(),
                    end_ms: end.timestamp_millis(),
                    min_elevation_deg: min_elevation,
                    max_passes,
                    collect_stats: args.stats,
                },
            },
        })
        .collect();

    let responses = if args.workers == 0 {
        let mut engine = PredictionEngine::new();
        requests
            .into_iter()
            .map(|request| dispatch::execute(&mut engine, request))
            .collect()
    } else {
        match dispatch_parallel(args.workers, requests) {
            Ok(responses) => responses,
            Err(e) => {
                eprintln!("Dispatch error: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    report(&records, responses, args.json)
}

fn resolve_station(args: &PassArgs, config: Option<&Config>) -> Option<GroundStation> {
    if let Some(coordinates) = &args.coordinates {
        return GroundStation::from_coordinates(coordinates, Some(args.altitude_m));
    }
    config.and_then(|c| c.ground_station().ok())
}

fn dispatch_parallel(
    workers: usize,
    requests: Vec<JobRequest>,
) -> Result<Vec<JobResponse>, String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime.block_on(async {
        let dispatcher = Arc::new(Dispatcher::new(workers));
        let mut jobs = tokio::task::JoinSet::new();
        for request in requests {
            let dispatcher = dispatcher.clone();
            jobs.spawn(async move { dispatcher.submit(request).await });
        }

        let mut responses = Vec::new();
        while let Some(joined) = jobs.join_next().await {
            responses.push(joined.map_err(|e| e.to_string())?);
        }
        responses.sort_by_key(|r| r.id);

        if let Some(dispatcher) = Arc::into_inner(dispatcher) {
            dispatcher.shutdown().await;
        }
        Ok(responses)
    })
}

fn report(records: &[TleRecord], responses: Vec<JobResponse>, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string_pretty(&responses) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("JSON error: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for response in responses {
        let name = records
            .get(response.id as usize - 1)
            .map(|r| r.display_name())
            .unwrap_or_else(|| format!("job {}", response.id));

        if !response.success {
            failed = true;
            eprintln!(
                "{name}: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
            continue;
        }

        let Some(JobResult::Passes { passes, stats }) = response.result else {
            continue;
        };
        println!("{name}: {} passes", passes.len());
        for pass in &passes {
            let apex = pass
                .apex_time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into());
            let shadow = if pass.eclipse_transitions.is_empty() {
                String::new()
            } else {
                format!("  {} eclipse transitions", pass.eclipse_transitions.len())
            };
            let ground = pass
                .min_ground_track_km
                .map(|d| format!("  closest {d:.0} km"))
                .unwrap_or_default();
            println!(
                "  {} -> {}  apex {} @ {:.1} deg  az {:.0} -> {:.0}  {} s{ground}{shadow}",
                pass.start.format("%Y-%m-%d %H:%M:%S"),
                pass.end.format("%H:%M:%S"),
                apex,
                pass.max_elevation_deg,
                pass.azimuth_start_deg,
                pass.azimuth_end_deg,
                pass.duration_seconds,
            );
        }
        if let Some(stats) = stats {
            println!(
                "  [{} iterations, {} propagations, {:.1} ms total]",
                stats.iterations, stats.propagation_calls, stats.total_ms
            );
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_position(tle: &Path) -> ExitCode {
    let records = match satpass::tle::load(tle) {
        Ok(records) if !records.is_empty() => records,
        Ok(_) => {
            eprintln!("No satellites found in {}", tle.display());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error loading TLEs: {e}");
            return ExitCode::FAILURE;
        }
    };

    let now = Utc::now();
    let mut engine = PredictionEngine::new();
    for (i, record) in records.iter().enumerate() {
        let request = JobRequest {
            id: i as u64 + 1,
            kind: JobKind::PropagateGeodetic {
                tle: record.text.clone(),
                timestamp_ms: now.timestamp_millis(),
            },
        };
        match dispatch::execute(&mut engine, request).result {
            Some(JobResult::Geodetic(Some(sample))) => {
                if let Some(geo) = sample.geodetic {
                    println!(
                        "{}: lat {:.3} lon {:.3} height {:.0} km",
                        record.display_name(),
                        geo.latitude_deg,
                        geo.longitude_deg,
                        geo.height_km
                    );
                }
            }
            _ => {
                println!("{}: no position (propagation failed)", record.display_name());
            }
        }
    }
    ExitCode::SUCCESS
}
