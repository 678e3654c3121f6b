use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use transit_sim::export;
use transit_sim::sim::initial_parameters::RunParameters;
use transit_sim::sim::integrator::{Integrator, Scheme};
use transit_sim::sim::scenarios::{ScenarioKind, ScenarioMetadata};
use transit_sim::sim::system::record_trajectory;
use transit_sim::sim::units::{Constants, Float};
use transit_sim::transit::detector::detect;
use transit_sim::transit::period_search::true_period;
use transit_sim::transit::synthesizer::TransitSynthesizer;

#[derive(Parser)]
#[command(name = "transit-sim")]
#[command(about = "N-body orbits and synthetic transit light curves")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate a scenario and report energy drift
    Run {
        #[arg(short, long, default_value = "stable_two_body")]
        scenario: ScenarioKind,
        /// Integration scheme: euler, verlet or rk4
        #[arg(long, default_value = "verlet")]
        scheme: Scheme,
        /// Time step in seconds
        #[arg(long, default_value_t = 86_400.)]
        dt: Float,
        #[arg(long, default_value_t = 365)]
        steps: usize,
        /// Seed for randomly generated scenarios
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Write body positions after every step to this CSV file
        #[arg(long)]
        trajectory: Option<PathBuf>,
    },

    /// Synthesize a light curve, detect transits and write the results
    Lightcurve {
        #[arg(short, long, default_value = "stable_two_body")]
        scenario: ScenarioKind,
        /// JSON file with run parameters; missing fields take defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "data/lightcurves")]
        output: PathBuf,
        #[arg(long)]
        scheme: Option<Scheme>,
        #[arg(long)]
        dt: Option<Float>,
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long)]
        noise_std: Option<Float>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the available scenarios
    Scenarios,
}

#[derive(Serialize)]
struct LightcurveMetadata<'a> {
    #[serde(flatten)]
    scenario: &'a ScenarioMetadata,
    lightcurve_file: String,
    events_file: String,
    n_events: usize,
    true_period_days: Option<Float>,
    parameters: &'a RunParameters,
}

fn run(
    scenario: ScenarioKind,
    scheme: Scheme,
    dt: Float,
    steps: usize,
    seed: u64,
    trajectory: Option<PathBuf>,
) -> Result<()> {
    let constants = Constants::default();
    let scenario = scenario.build(&constants, seed)?;
    tracing::info!(
        "Loaded scenario: {} with {} bodies, stability={:?}",
        scenario.metadata.scenario,
        scenario.bodies.len(),
        scenario.metadata.stability
    );
    let mut system = scenario.into_system(&constants)?;
    let initial_energy = system.total_energy();
    let integrator = Integrator::new(scheme);

    let samples = record_trajectory(&mut system, &integrator, dt, steps)?;
    if let Some(path) = trajectory {
        export::write_trajectory_csv(&path, &samples)
            .with_context(|| format!("writing trajectory to {:?}", path))?;
        tracing::info!("Exported positions to {:?}", path);
    }

    let final_energy = system.total_energy();
    println!(
        "{} steps of {} s with {}: t = {:.3e} s, relative energy drift = {:.3e}",
        steps,
        dt,
        scheme,
        system.current_time(),
        (final_energy - initial_energy) / initial_energy.abs()
    );
    for (i, body) in system.bodies().iter().enumerate() {
        println!("body {}: position = {:?}", i, body.position());
    }
    Ok(())
}

fn lightcurve(scenario: ScenarioKind, params: RunParameters, output: PathBuf) -> Result<()> {
    params.validate()?;
    let seed = params.seed.unwrap_or_else(rand::random);
    let scenario = scenario.build(&params.constants, seed)?;
    tracing::info!(
        "Loaded scenario: {} with {} bodies",
        scenario.metadata.scenario,
        scenario.bodies.len()
    );
    let metadata = scenario.metadata.clone();
    let radii = params.radii_for(scenario.bodies.len());
    let mut system = scenario.into_system(&params.constants)?;

    let synthesizer =
        TransitSynthesizer::new(params.star_radius, radii, params.line_of_sight, params.noise_std)?;
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let series = synthesizer.run(
        &Integrator::new(params.scheme),
        &mut system,
        params.dt,
        params.steps,
        &mut rng,
    )?;
    let events = detect(&series, params.threshold_sigma);

    let lightcurve_path = output.join("lc.csv");
    let events_path = output.join("events.json");
    export::write_flux_csv(&lightcurve_path, &series)
        .with_context(|| format!("writing light curve to {:?}", lightcurve_path))?;
    export::write_json(&events_path, &events)?;
    export::write_json(
        &output.join("metadata.json"),
        &LightcurveMetadata {
            scenario: &metadata,
            lightcurve_file: lightcurve_path.display().to_string(),
            events_file: events_path.display().to_string(),
            n_events: events.len(),
            true_period_days: true_period(&events),
            parameters: &params,
        },
    )?;

    tracing::info!(
        "Generated light curve with {} samples and {} transit events in {:?}",
        series.len(),
        events.len(),
        output
    );
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            scheme,
            dt,
            steps,
            seed,
            trajectory,
        } => run(scenario, scheme, dt, steps, seed, trajectory)?,

        Commands::Lightcurve {
            scenario,
            config,
            output,
            scheme,
            dt,
            steps,
            noise_std,
            seed,
        } => {
            let mut params = match config {
                Some(path) => RunParameters::from_json_file(&path)
                    .with_context(|| format!("loading run parameters from {:?}", path))?,
                None => RunParameters::default(),
            };
            if let Some(scheme) = scheme {
                params.scheme = scheme;
            }
            if let Some(dt) = dt {
                params.dt = dt;
            }
            if let Some(steps) = steps {
                params.steps = steps;
            }
            if let Some(noise_std) = noise_std {
                params.noise_std = noise_std;
            }
            if seed.is_some() {
                params.seed = seed;
            }
            lightcurve(scenario, params, output)?
        }

        Commands::Scenarios => {
            for kind in ScenarioKind::ALL {
                println!("{}", kind);
            }
        }
    }
    Ok(())
}
