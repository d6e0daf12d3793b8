//! Combo Cast - Entry Point
//!
//! Interactive demo host. Actors are referred to by name; every command is
//! translated into an input event and pushed onto the engine's event bus,
//! exactly as a game-server adapter would do with its own callbacks.

use ahash::AHashMap;
use clap::Parser;
use combo_cast::core::error::Result;
use combo_cast::core::types::{ActorId, ClickType};
use combo_cast::engine::{CastingEngine, Collaborators, EventBus};
use combo_cast::host::{AbilityInvoker, ActorProfile, Feedback, MemoryProfiles};
use combo_cast::loader::ConfigCache;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Click-combo casting demo
#[derive(Parser, Debug)]
#[command(name = "combo-cast")]
#[command(about = "Drive the click-combo casting engine from the terminal")]
struct Args {
    /// Casting configuration file (TOML)
    #[arg(long, default_value = "config/casting.toml")]
    config: PathBuf,

    /// tracing filter directive
    #[arg(long, default_value = "combo_cast=debug")]
    log_filter: String,
}

/// Prints feedback to the terminal
struct ConsoleFeedback {
    names: Arc<parking_lot::RwLock<AHashMap<ActorId, String>>>,
}

impl Feedback for ConsoleFeedback {
    fn notify(&self, actor: ActorId, message: &str, sound: Option<&str>) {
        let names = self.names.read();
        let name = names.get(&actor).map_or("?", String::as_str);
        match sound {
            Some(sound) => println!("[{}] {} ({})", name, message, sound),
            None => println!("[{}] {}", name, message),
        }
    }
}

/// Pretends to cast and always succeeds
struct ConsoleInvoker;

impl AbilityInvoker for ConsoleInvoker {
    fn cast(&self, actor: ActorId, skill_id: &str) -> bool {
        tracing::info!("Executing skill '{}' for {}", skill_id, actor);
        true
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter.as_str())
        .init();

    tracing::info!("Combo Cast starting...");

    let rt = Runtime::new()?;

    let cache = ConfigCache::new();
    if let Err(e) = cache.load(&args.config) {
        tracing::warn!("Using built-in defaults: {}", e);
    }

    let names: Arc<parking_lot::RwLock<AHashMap<ActorId, String>>> = Arc::default();
    let profiles = Arc::new(MemoryProfiles::new());
    let hosts = Collaborators {
        feedback: Arc::new(ConsoleFeedback {
            names: names.clone(),
        }),
        invoker: Arc::new(ConsoleInvoker),
        profiles: profiles.clone(),
    };

    let engine = CastingEngine::with_runtime(rt.handle().clone(), cache, hosts);
    let (bus, events) = EventBus::new();
    let engine_loop = rt.spawn(engine.clone().run(events));

    println!("\n=== COMBO CAST ===");
    println!();
    println!("Commands:");
    println!("  class <actor> <class> <level> - Set an actor's class and level");
    println!("  toggle <actor>                - Switch casting mode");
    println!("  click <actor> l|r             - Primary or secondary click");
    println!("  attack <actor>                - Attack an entity");
    println!("  remove <actor>                - Actor leaves");
    println!("  reload                        - Reload the configuration");
    println!("  status <actor>                - Show the actor's session");
    println!("  quit / q                      - Exit");
    println!();

    let mut actors: AHashMap<String, ActorId> = AHashMap::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();

        let mut actor_id = |name: &str| -> ActorId {
            *actors.entry(name.to_string()).or_insert_with(|| {
                let id = ActorId::new();
                names.write().insert(id, name.to_string());
                id
            })
        };

        match words.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["class", name, class, level] => match level.parse::<u32>() {
                Ok(level) => {
                    let id = actor_id(*name);
                    profiles.set(id, class.to_lowercase(), level);
                    println!("{} is now a level {} {}", name, level, class);
                }
                Err(_) => println!("Usage: class <actor> <class> <level>"),
            },
            ["toggle", name] => {
                bus.toggle(actor_id(*name));
            }
            ["click", name, side] => match side.chars().next().and_then(ClickType::from_char) {
                Some(click) => {
                    bus.click(actor_id(*name), click);
                }
                None => println!("Usage: click <actor> l|r"),
            },
            ["attack", name] => {
                bus.attack(actor_id(*name));
            }
            ["remove", name] => {
                let id = actor_id(*name);
                bus.remove_actor(id);
                profiles.clear(id);
            }
            ["reload"] => {
                bus.reload();
            }
            ["status", name] => {
                let id = actor_id(*name);
                let snapshot = engine.snapshot(id);
                let level = profiles.level_of(id);
                match serde_json::to_string_pretty(&snapshot) {
                    Ok(json) => println!("{} (level {}):\n{}", name, level, json),
                    Err(e) => println!("Cannot render status: {}", e),
                }
            }
            ["stats"] => match serde_json::to_string_pretty(&engine.stats()) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("Cannot render stats: {}", e),
            },
            _ => println!("Unknown command. Available: class, toggle, click, attack, remove, reload, status, stats, quit"),
        }

        // Let the engine process the event before the next prompt
        rt.block_on(tokio::time::sleep(std::time::Duration::from_millis(25)));
    }

    drop(bus);
    if let Err(e) = rt.block_on(engine_loop) {
        tracing::error!("Engine loop ended abnormally: {}", e);
    }

    let stats = engine.stats();
    println!(
        "\nGoodbye! {} activations, {} combos resolved.",
        stats.activations, stats.resolutions
    );
    Ok(())
}
