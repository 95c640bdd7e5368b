mod animator;
mod config;
mod feed;
mod link;
mod simulate;
mod web;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use crate::animator::Animator;
use crate::config::{Config, TimeConfig};
use crate::feed::{ecef_to_geodetic, AltitudeUnit, FeedSession, TimePolicy};
use crate::link::FeedLink;
use crate::simulate::Simulator;

#[derive(Parser)]
#[command(name = "sat-o-scope")]
#[command(about = "Live satellite telemetry to animation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the producer and serve the live view
    Run {
        #[arg(short, long, default_value = "config.yml")]
        config: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long, default_value = "config.yml")]
        config: String,
    },
    /// Feed a file of JSON samples (one per line) through a fresh session
    Replay {
        #[arg(short, long, default_value = "config.yml")]
        config: String,
        #[arg(short, long)]
        input: String,
        #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
        step: Duration,
    },
    /// Serve SGP4-propagated samples for a TLE over a websocket
    Simulate {
        #[arg(long)]
        tle: String,
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
        #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
        interval: Duration,
        #[arg(long, value_enum, default_value_t = TimePolicy::StrictIso)]
        policy: TimePolicy,
        #[arg(long)]
        local_offset: Option<String>,
        #[arg(long, value_enum, default_value_t = AltitudeUnit::Meters)]
        altitude_unit: AltitudeUnit,
        /// Simulated time of the first sample (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_start)]
        start: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(&config).await,
        Commands::Validate { config } => validate(&config),
        Commands::Replay {
            config,
            input,
            step,
        } => replay(&config, &input, step),
        Commands::Simulate {
            tle,
            bind,
            interval,
            policy,
            local_offset,
            altitude_unit,
            start,
        } => {
            let time = TimeConfig {
                policy,
                local_offset,
            };
            simulate(&tle, &bind, interval, &time, altitude_unit, start).await
        }
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

async fn run(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let settings = match config.feed_settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut link = FeedLink::new(config.feed.clone(), settings);
    if let Err(e) = link.run() {
        eprintln!("Failed to start feed link: {}", e);
        return ExitCode::FAILURE;
    }
    let animator = Animator::spawn(link.handle(), config.clock.tick_interval);

    let result = web::run_server(config, link.handle()).await;

    animator.stop().await;
    link.stop().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  feed:          {}", config.feed.url);
    println!(
        "  reconnect:     {:?} .. {:?}, attempts {}",
        config.feed.reconnect.initial_delay,
        config.feed.reconnect.max_delay,
        config
            .feed
            .reconnect
            .max_attempts
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    match config.time.normalizer() {
        Ok(n) if n.policy() == TimePolicy::LocalShift => {
            println!("  time policy:   {} ({})", n.policy(), n.local_offset())
        }
        Ok(n) => println!("  time policy:   {}", n.policy()),
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    }
    println!("  altitude unit: {}", config.altitude_unit);
    println!(
        "  clock:         x{} every {:?}",
        config.clock.multiplier, config.clock.tick_interval
    );
    println!("  web:           {}", config.web.bind);
    ExitCode::SUCCESS
}

fn replay(config_path: &str, input: &str, step: Duration) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };
    let settings = match config.feed_settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if step.is_zero() {
        eprintln!("--step must be greater than zero");
        return ExitCode::FAILURE;
    }
    let content = match fs::read_to_string(input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = FeedSession::new(settings, Utc::now());
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(e) = session.handle_message(line) {
            eprintln!("  line {}: {}", i + 1, e);
        }
    }

    let stats = session.stats();
    println!(
        "Replayed {} samples ({} rejected, {} out of order)",
        stats.accepted, stats.rejected, stats.out_of_order
    );

    let Some((start, end)) = session.track().span() else {
        println!("Track is empty");
        return ExitCode::SUCCESS;
    };
    let step = chrono::Duration::from_std(step).unwrap_or(chrono::Duration::seconds(10));

    let mut t = start;
    while t <= end {
        if let Some(position) = session.track().interpolate(t) {
            let geo = ecef_to_geodetic(&position);
            println!(
                "  {}  lat {:>9.4}  lon {:>9.4}  alt {:.3} {}",
                settings.normalizer.format(t),
                geo.lat_deg,
                geo.lon_deg,
                settings.altitude_unit.from_meters(geo.alt_m),
                settings.altitude_unit
            );
        }
        t += step;
    }
    ExitCode::SUCCESS
}

async fn simulate(
    tle_path: &str,
    bind: &str,
    interval: Duration,
    time: &TimeConfig,
    altitude_unit: AltitudeUnit,
    start: Option<DateTime<Utc>>,
) -> ExitCode {
    let normalizer = match time.normalizer() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let tle = match fs::read_to_string(tle_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let simulator = match Simulator::from_tle(&tle, normalizer, altitude_unit) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("TLE error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match simulate::run_simulator(bind, simulator, interval, start).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Simulator error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_start(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_arguments() {
        let cli = Cli::try_parse_from([
            "sat-o-scope",
            "simulate",
            "--tle",
            "iss.tle",
            "--interval",
            "250ms",
            "--policy",
            "local_shift",
            "--local-offset",
            "+9h",
            "--altitude-unit",
            "kilometers",
            "--start",
            "2008-09-20T12:30:00Z",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate {
                interval,
                policy,
                altitude_unit,
                start,
                bind,
                ..
            } => {
                assert_eq!(interval, Duration::from_millis(250));
                assert_eq!(policy, TimePolicy::LocalShift);
                assert_eq!(altitude_unit, AltitudeUnit::Kilometers);
                assert_eq!(bind, "127.0.0.1:3000");
                assert_eq!(
                    start.unwrap(),
                    parse_start("2008-09-20T12:30:00+00:00").unwrap()
                );
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn rejects_unknown_policy_and_unit() {
        for (flag, value) in [("--policy", "iso"), ("--altitude-unit", "feet")] {
            let args = ["sat-o-scope", "simulate", "--tle", "iss.tle", flag, value];
            assert!(Cli::try_parse_from(args).is_err(), "{} {} accepted", flag, value);
        }
    }

    #[test]
    fn simulate_defaults_match_config_names() {
        let cli = Cli::try_parse_from(["sat-o-scope", "simulate", "--tle", "iss.tle"]).unwrap();
        match cli.command {
            Commands::Simulate {
                policy,
                altitude_unit,
                ..
            } => {
                assert_eq!(policy, TimePolicy::StrictIso);
                assert_eq!(altitude_unit, AltitudeUnit::Meters);
            }
            _ => panic!("expected simulate"),
        }
    }
}
