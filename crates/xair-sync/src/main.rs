mod console;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use xair_sync::{
    CommandSender, DiscoveryResult, DiscoveryStatus, NameDiscoverer, SceneOutcome, SceneRouter,
    SyncConfig,
};

use crate::console::Input;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("XAIR_SYNC_REVISION"), ")");

#[derive(Parser, Debug)]
#[command(name = "xair-sync", about = "Scene-driven snapshot recall for X Air mixers", version = VERSION)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config/xair-sync.toml", global = true)]
    config: PathBuf,

    /// Mixer address (overrides the config file)
    #[arg(long, env = "XAIR_HOST", global = true)]
    host: Option<String>,

    /// Mixer OSC port (overrides the config file)
    #[arg(long, env = "XAIR_PORT", global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read scene changes from stdin and recall the mapped snapshots
    Run,
    /// Recall one snapshot (1-64)
    Recall {
        #[arg(allow_hyphen_values = true)]
        slot: i64,
    },
    /// Query the mixer for its snapshot names
    Discover {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective scene → snapshot mapping as JSON
    Scenes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;

    match &args.command {
        Commands::Run => run_daemon(&args, config).await?,
        Commands::Recall { slot } => {
            let slot = *slot;
            let endpoint = config.endpoint();
            let sender = CommandSender::try_connect(endpoint, config.mixer.index_base).await?;
            sender.recall(slot).await?;
            println!("Snapshot #{} recall sent to {}", slot, config.endpoint());
        }
        Commands::Discover { json } => {
            let discoverer = NameDiscoverer::new(config.discovery_config());
            let result = discoverer.discover(&config.endpoint()).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result.entries)?);
            } else {
                print_discovery(&config, &result);
            }
        }
        Commands::Scenes => {
            println!("{}", config.scene_map()?.to_json());
        }
    }

    Ok(())
}

async fn load_config(args: &Args) -> anyhow::Result<SyncConfig> {
    let mut config = SyncConfig::load_or_default(&args.config).await.map_err(|e| {
        error!("{}", e);
        e
    })?;
    apply_overrides(&mut config, args);
    Ok(config)
}

fn apply_overrides(config: &mut SyncConfig, args: &Args) {
    if let Some(host) = &args.host {
        config.mixer.host = host.clone();
    }
    if let Some(port) = args.port {
        config.mixer.port = port;
    }
}

fn print_discovery(config: &SyncConfig, result: &DiscoveryResult) {
    println!("Snapshots on {}", config.endpoint());
    println!("══════════════════════════════");
    match result.status() {
        DiscoveryStatus::NoReplies => {
            println!("  No replies. Is the mixer reachable, or is UDP blocked by a firewall?");
        }
        DiscoveryStatus::Found(count) => {
            for entry in &result.entries {
                println!("  {:>2}  {}", entry.index, entry.name);
            }
            println!("──────────────────────────────");
            println!("  {} of 64 slots named ({} ms)", count, result.elapsed.as_millis());
        }
    }
    if result.malformed > 0 || result.ignored > 0 {
        println!(
            "  Dropped: {} malformed, {} unrelated",
            result.malformed, result.ignored
        );
    }
}

/// Daemon loop: stdin lines are forwarded through a channel to the router.
async fn run_daemon(args: &Args, config: SyncConfig) -> anyhow::Result<()> {
    let mut router = SceneRouter::new(&config).await?;
    let mut discovery_config = config.discovery_config();

    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    let stdin_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("stdin read error: {}", e);
                    break;
                }
            }
        }
    });

    let mut discovery_handle: Option<JoinHandle<()>> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Waiting for scene changes on stdin (:discover, :reload, :quit)");

    loop {
        let line = tokio::select! {
            line = line_rx.recv() => line,
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
        };

        let Some(line) = line else {
            info!("stdin closed, shutting down");
            break;
        };

        match console::parse_line(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Unknown(cmd) => warn!(command = %cmd, "Unknown command"),
            Input::Scene(scene) => match router.on_scene_changed(&scene).await {
                Ok(SceneOutcome::Recalled(index)) => {
                    info!(scene = %scene, slot = %index, "Scene recalled snapshot")
                }
                Ok(_) => {}
                Err(e) => error!(scene = %scene, "Snapshot recall failed: {}", e),
            },
            Input::Reload => match load_config(args).await {
                Ok(new_config) => {
                    if let Err(e) = router.reconfigure(&new_config).await {
                        warn!("Mapping not updated: {}", e);
                    }
                    discovery_config = new_config.discovery_config();
                }
                Err(e) => error!("Reload failed, keeping current settings: {}", e),
            },
            Input::Discover => {
                if discovery_handle.as_ref().is_some_and(|h| !h.is_finished()) {
                    warn!("Discovery already in progress");
                    continue;
                }
                // Endpoint is captured now; later reloads don't affect this run
                let endpoint = router.endpoint().clone();
                let discoverer = NameDiscoverer::new(discovery_config);
                discovery_handle = Some(tokio::spawn(async move {
                    match discoverer.discover(&endpoint).await {
                        Ok(result) => {
                            for entry in &result.entries {
                                println!("{:>2}\t{}", entry.index, entry.name);
                            }
                            if result.status() == DiscoveryStatus::NoReplies {
                                println!("no replies from {}", endpoint);
                            }
                        }
                        Err(e) => error!(endpoint = %endpoint, "Discovery failed: {}", e),
                    }
                }));
            }
        }
    }

    if let Some(handle) = discovery_handle {
        handle.abort();
    }
    stdin_handle.abort();

    Ok(())
}
