use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use elevator_rl::action::ActionHistory;
use elevator_rl::arrivals::{ArrivalSource, FixedArrivals, TrendGenerator};
use elevator_rl::config::Config;
use elevator_rl::state::{Destinations, HallCalls, State};
use elevator_rl::trainer::Trainer;
use elevator_rl::world::World;


/// Command line argument parser.
#[derive(Parser, Debug)]
#[command(about = "Learn a two-elevator dispatch policy by trial and error", long_about = None)]
pub struct Args {
    /// Path to TOML configuration file.
    config_path: PathBuf,

    #[command(subcommand)]
    command: Commands
}


#[derive(Subcommand, Debug)]
enum Commands {
    /// Train for the configured number of episodes and write the value table.
    Train {
        /// Override the number of episodes.
        #[arg(long)]
        episodes: Option<u32>,
    },
    /// Print one generated day of passenger arrivals.
    Scenario,
    /// Print the state space size of the configured building.
    Space,
    /// Print the legal actions with both elevators idle on the given floors.
    Legal {e1: u8, e2: u8},
}


fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = Config::load(&args.config_path)
        .with_context(|| format!("Loading {}", args.config_path.display()))?;

    match &args.command {
        Commands::Train {episodes} => {
            let trainer = Trainer::new(config.clone());
            let (engine, stats) = trainer.run(*episodes);
            if let Some(last) = stats.last() {
                println!("Trained {} episodes, {} states, last mean delay: {:?}",
                         stats.len(), last.states, last.mean_delay);
            }
            trainer.save(&engine, &stats).with_context(|| format!(
                "Saving results of {} episodes to {}",
                stats.len(), trainer.config().training.table_path.display()))?;
        }
        Commands::Scenario => {
            let mut generator = TrendGenerator::new(config.building.floors(), &config.scenario);
            let mut day = generator.day(0, config.building.day_duration);
            day.sort_by_key(|r| r.tick);
            for request in day.iter() {
                println!("{}", request);
            }
            println!("{} requests", day.len());
        }
        Commands::Space => {
            let floors = config.building.floors();
            println!("State space size: {}", State::space_size(floors));
        }
        Commands::Legal {e1, e2} => {
            let floors = config.building.floors();
            if !floors.contains(*e1) || !floors.contains(*e2) {
                anyhow::bail!("Floors must lie in [{}, {}]", floors.min, floors.max);
            }
            let world = World::new(&config.building, &config.scenario,
                                   FixedArrivals::new(Vec::new()));
            let state = State::new(floors, [*e1, *e2], [Destinations::default(); 2],
                                   vec![HallCalls::default(); floors.count()], 0);
            let history = ActionHistory::default();
            for action in world.legal_actions(&state, history.previous, history.prior) {
                println!("{}", action);
            }
        }
    }
    Ok(())
}
