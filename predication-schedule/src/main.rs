use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use predication_schedule::config::AppConfig;
use predication_schedule::display::{print_period_schedule, write_schedule_csv, write_schedule_to_file};
use predication_schedule::parser::{eligible_captains, load_fixed_assignments, load_roster};
use predication_schedule::schedule::{
    find_slot, generate_period, parse_date, resolve, CaptainId, ResolveOptions, RotationCursor, RotationScope,
    Strategy,
};
use predication_schedule::web;

#[derive(Parser)]
#[command(name = "predication-schedule", about = "Captain schedule for preaching outings")]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "schedule.toml")]
    config: PathBuf,
    /// Roster CSV, overrides the config
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Fixed assignments CSV, overrides the config
    #[arg(long)]
    fixed: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the schedule for a period
    Generate {
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// One continuous rotation across all slots
        #[arg(long)]
        global_rotation: bool,
        /// Text output file
        #[arg(long)]
        out: Option<PathBuf>,
        /// CSV output file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Resolve the captain for a single date and slot.
    ///
    /// Each run starts without rotation history, so `--strategy rotation` always
    /// returns the first available captain in roster order. Picks are random by default;
    /// use `generate` or the web API for a rotation that advances.
    Resolve {
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: String,
        /// Captain ids to skip
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<CaptainId>,
        /// Defaults to random; rotation here means first available
        #[arg(long, value_enum, default_value_t = Strategy::Random)]
        strategy: Strategy,
    },
    /// Run the web server
    Web {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(roster) = cli.roster {
        config.roster_path = roster;
    }
    if let Some(fixed) = cli.fixed {
        config.fixed_path = fixed;
    }

    match cli.command {
        Command::Web { port } => {
            if let Some(port) = port {
                config.web.port = port;
            }
            println!("Starting web server on port {}...", config.web.port);
            println!("Access the site at http://localhost:{}", config.web.port);
            web::start_server(config).await?;
        }
        Command::Generate {
            from,
            to,
            strategy,
            global_rotation,
            out,
            csv,
        } => {
            let roster = load_roster(&config.roster_path)?;
            let captains = eligible_captains(&roster);
            let fixed = load_fixed_assignments(&config.fixed_path)?;
            info!("{} captains, {} fixed assignments", captains.len(), fixed.len());

            let mut options = config.generate_options();
            if let Some(strategy) = strategy {
                options.strategy = strategy;
            }
            if global_rotation {
                options.rotation_scope = RotationScope::Global;
            }

            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            let mut cursor = RotationCursor::new();
            let schedule = generate_period(
                from,
                to,
                &config.time_slots,
                &fixed,
                &captains,
                options,
                &mut cursor,
                &mut rand::thread_rng(),
            )?;

            let title = if config.congregation.is_empty() {
                format!("Preaching schedule {} - {}", from, to)
            } else {
                format!("{}: preaching schedule {} - {}", config.congregation, from, to)
            };
            print_period_schedule(&title, &schedule, &config.time_slots, &roster);

            if let Some(path) = out {
                write_schedule_to_file(&title, &schedule, &config.time_slots, &roster, &path)?;
                println!("Schedule saved to {}", path.display());
            }
            if let Some(path) = csv {
                write_schedule_csv(&schedule, &config.time_slots, &roster, &path)?;
                println!("Schedule saved to {}", path.display());
            }
        }
        Command::Resolve {
            date,
            slot,
            exclude,
            strategy,
        } => {
            find_slot(&config.time_slots, &slot)?;
            let roster = load_roster(&config.roster_path)?;
            let captains = eligible_captains(&roster);
            let fixed = load_fixed_assignments(&config.fixed_path)?;
            let exclude: HashSet<CaptainId> = exclude.into_iter().collect();
            let mut cursor = RotationCursor::new();

            let captain = resolve(
                &date,
                &slot,
                &fixed,
                &captains,
                ResolveOptions {
                    strategy,
                    rotation: Some(&mut cursor),
                    exclude: Some(&exclude),
                    rotation_key: None,
                },
            )?;

            match captain {
                Some(id) => {
                    let name = roster
                        .iter()
                        .find(|m| m.id == id)
                        .map(|m| m.name.as_str())
                        .unwrap_or(id.as_str());
                    println!("{} {} -> {} ({})", date, slot, name, id);
                }
                None => println!("{} {} -> no captain available", date, slot),
            }
        }
    }

    Ok(())
}
