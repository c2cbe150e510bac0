use std::path::PathBuf;

use clap::Parser;
use ecosim::simulation::ecosystem::Ecosystem;
use ecosim::simulation::params::Params;
use ecosim::simulation::persistence;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Runs the ecosystem without a display and prints its statistics.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Seed overriding the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Save the final population to this file
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => Params::from_file(path)?,
        None => Params::default(),
    };
    if args.seed.is_some() {
        params.seed = args.seed;
    }

    let mut ecosystem = Ecosystem::new(params)?;
    info!("Running {} ticks", args.ticks);
    for _ in 0..args.ticks {
        ecosystem.step();
    }

    println!("tick\tpopulation\tavg_fitness\tmax_fitness\tavg_energy\tspecies\tbirths\tdeaths");
    for s in ecosystem.history().iter() {
        println!(
            "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{}\t{}\t{}",
            s.tick,
            s.population,
            s.avg_fitness,
            s.max_fitness,
            s.avg_energy,
            s.species_count,
            s.births,
            s.deaths
        );
    }

    if let Some(last) = ecosystem.history().latest() {
        info!(
            "Finished at tick {} with {} agents (max fitness {:.1})",
            last.tick, last.population, last.max_fitness
        );
    }
    for species in ecosystem.species().iter() {
        info!(
            "Species {}: {} members, founded at tick {}",
            species.id, species.population, species.created_tick
        );
    }

    if let Some(path) = &args.save {
        persistence::save_to_file(ecosystem.agents(), path)?;
        info!("Saved {} agents to {}", ecosystem.population(), path.display());
    }

    Ok(())
}
