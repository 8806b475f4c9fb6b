//! Scenario replay - stream a scripted flight to the land detector.
//!
//! Sends the scenario's telemetry at a fixed rate and prints every change in
//! the published land detection state, then the recorded flight time.
//!
//! Usage:
//!   cargo run -p land-cli --bin fly_scenario -- --scenario hop

use anyhow::{bail, Result};
use clap::Parser;
use land_cli::{parse_param_assignment, scenario_by_name, LandClient, SCENARIO_NAMES};
use land_core::{LandDetectionResult, ParamValue};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a scripted flight against the land detector")]
struct Args {
    /// Land detector service URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Scenario to fly (hop, freefall, range-dropout)
    #[arg(long, default_value = "hop")]
    scenario: String,

    /// Telemetry rate (Hz)
    #[arg(long, default_value_t = 20.0)]
    rate: f64,

    /// Parameter to set before flying, as NAME=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_param_assignment)]
    params: Vec<(String, ParamValue)>,
}

fn describe(result: &LandDetectionResult) -> String {
    let alt_max = if result.alt_max.is_finite() {
        format!("{:.1} m", result.alt_max)
    } else {
        "unlimited".to_string()
    };
    format!(
        "landed={} maybe_landed={} ground_contact={} freefall={} ground_effect={} alt_max={}",
        result.landed,
        result.maybe_landed,
        result.ground_contact,
        result.freefall,
        result.in_ground_effect,
        alt_max
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("land_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let Some(scenario) = scenario_by_name(&args.scenario) else {
        bail!(
            "unknown scenario '{}', expected one of: {}",
            args.scenario,
            SCENARIO_NAMES.join(", ")
        );
    };
    if !(args.rate.is_finite() && args.rate > 0.0) {
        bail!("--rate must be a positive number");
    }

    let client = LandClient::new(&args.url);
    for (name, value) in &args.params {
        client.set_param(name, *value).await?;
        println!("Set {} = {:?}", name, value);
    }

    println!("Scenario: {} ({})", scenario.name, scenario.description);
    println!(
        "Duration: {:.1} s at {} Hz against {}",
        scenario.duration().as_secs_f64(),
        args.rate,
        args.url
    );
    println!();

    let mut ticker = time::interval(Duration::from_secs_f64(1.0 / args.rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let start = Instant::now();
    let mut last_phase = "";
    let mut last_result: Option<LandDetectionResult> = None;

    loop {
        ticker.tick().await;
        let elapsed = start.elapsed();
        let Some(sample) = scenario.sample_at(elapsed) else {
            break;
        };

        if sample.phase != last_phase {
            println!("[{:6.2}s] phase -> {}", elapsed.as_secs_f64(), sample.phase);
            last_phase = sample.phase;
        }

        if let Err(err) = client.send_sample(&sample).await {
            tracing::warn!("Telemetry send failed: {:#}", err);
            continue;
        }

        match client.land_detected().await {
            Ok(Some(result)) => {
                let changed = last_result
                    .as_ref()
                    .map_or(true, |previous| result.differs_from(previous));
                if changed {
                    println!("[{:6.2}s]   {}", elapsed.as_secs_f64(), describe(&result));
                    last_result = Some(result);
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Land detection fetch failed: {:#}", err),
        }
    }

    // Let the detector settle the final landing before reading totals
    time::sleep(Duration::from_secs(1)).await;
    let status = client.status().await?;
    println!();
    println!("Total recorded flight time: {:.2} s", status.total_flight_time_s);
    if let Some(result) = status.land_detected {
        println!("Final state: {}", describe(&result));
    }

    Ok(())
}
