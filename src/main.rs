use clap::Parser;
use std::path::PathBuf;

use colony_sim::registry::JobKind;
use colony_sim::save::SaveStore;
use colony_sim::simulation::{process_turn, GameState, MoveTarget};
use colony_sim::worldgen;

#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "Run the hex colony simulation headlessly")]
struct Args {
    /// Name of the world (also the save file name)
    #[arg(long, default_value = "demo")]
    world: String,

    /// Load an existing save instead of generating a new world
    #[arg(long)]
    load: bool,

    /// Map radius in hex rings
    #[arg(short, long, default_value = "50")]
    radius: i32,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of turns to simulate
    #[arg(short, long, default_value = "10")]
    turns: u32,

    /// Directory for save files
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    let store = SaveStore::new(&args.save_dir);

    let (mut world, mut state) = if args.load {
        let loaded = store.load(&args.world).expect("failed to load save");
        for warning in &loaded.warnings {
            println!("hydration: {warning}");
        }
        match loaded.timestamp {
            Some(stamp) => println!("Loaded world '{}' (saved {stamp})", args.world),
            None => println!("Loaded world '{}'", args.world),
        }
        (loaded.world, loaded.state)
    } else {
        let seed = args.seed.unwrap_or_else(rand::random);
        println!("Generating world '{}' with seed {seed}...", args.world);
        let world = worldgen::generate(args.radius, seed);
        println!("World generated: {} tiles", world.len());
        let spawn = worldgen::find_safe_spawn(&world);
        println!("Spawn found at: {spawn}");
        (world, GameState::new(spawn))
    };

    // A fresh colony: settle immediately and put everyone to work, food
    // first.
    if state.settlements.is_empty() && state.tribe.is_some() {
        let index = state
            .found_settlement(MoveTarget::Tribe, "New Outpost", &world)
            .expect("founding at the spawn tile failed");
        let town = &mut state.settlements[index];
        for job in [JobKind::Forager, JobKind::Gatherer, JobKind::Scholar] {
            while town.assign_job(job, 1) {}
        }
        println!(
            "Founded '{}' at {} (population {})",
            town.name, town.location, town.population
        );
    }

    for _ in 0..args.turns {
        let resolved = state.turn;
        if let Some(record) = process_turn(&mut state, &mut world) {
            println!("--- Turn {} ---", record.turn);
            for event in &record.events {
                println!("  [{}] {}", event.source, event.text);
            }
        } else {
            println!("--- Turn {resolved} --- (quiet)");
        }
    }

    let path = store.save(&args.world, &state, &world).expect("failed to save world");
    println!(
        "Saved '{}' after {} turns to {}",
        args.world,
        state.turn - 1,
        path.display()
    );
}
