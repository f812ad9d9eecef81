use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{info, warn};
use pkmn_link_cli::bgb::{self, BridgeMode, LinkEvent};
use pkmn_link_cli::config::{self, PartyConfig};
use pkmn_link_cli::replay;
use pkmn_link_core::platform::{PendingTasks, RawSpecies};
use pkmn_link_core::session::Session;
use pkmn_link_core::status::StatusCell;

#[derive(Parser)]
#[command(author, version, about = "Trade Gen I pokemon over an emulated link cable")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Party config to offer from (defaults to the user config directory)
    #[arg(long, global = true)]
    party: Option<PathBuf>,

    /// Enable debug logging of link traffic
    #[arg(long, global = true)]
    debug: bool,

    /// Write the traded-in pokemon back to the party config
    #[arg(long, global = true)]
    save: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Act as the passive side of a BGB link connection
    Bgb {
        /// Wait for the emulator to connect on this port
        #[arg(long, conflicts_with = "connect")]
        listen: Option<u16>,

        /// Connect to an emulator listening at HOST:PORT
        #[arg(long, value_parser = BridgeMode::connect_to)]
        connect: Option<BridgeMode>,
    },
    /// Feed hex bytes from a file through the session and print the replies
    Replay {
        /// Script of whitespace separated hex bytes
        file: PathBuf,
    },
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run_bgb(
    mode: BridgeMode,
    session: Session,
    pending: Arc<PendingTasks>,
) -> Result<Session, Box<dyn Error>> {
    let bridge = bgb::spawn_bridge(mode, session, pending)?;
    for event in bridge.events().iter() {
        match event {
            LinkEvent::Listening { port } => println!("Waiting for BGB on port {port}"),
            LinkEvent::Connected { peer } => println!("Linked with {peer}"),
            LinkEvent::StatusChanged(status) => println!("{status}"),
            LinkEvent::Traded { display_index } => println!("Received pokemon #{display_index}"),
            LinkEvent::RemotePaused => println!("Partner paused"),
            LinkEvent::RemoteResumed => println!("Partner resumed"),
            LinkEvent::Disconnected => println!("Link closed"),
        }
    }
    Ok(bridge.join()?)
}

fn run_replay(
    file: &Path,
    session: &mut Session,
    pending: &PendingTasks,
) -> Result<(), Box<dyn Error>> {
    let bytes = replay::load_script(file)?;
    info!("Replaying {} bytes from {}", bytes.len(), file.display());

    let steps = replay::run(session, pending, &bytes);
    for step in &steps {
        println!("{:02X} -> {:02X}  {}", step.inbound, step.reply, step.status);
    }
    println!(
        "Final status: {}, trade state {:?}",
        session.status(),
        session.trade_state()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let party_path = args
        .party
        .clone()
        .unwrap_or_else(config::default_party_config_path);
    let party = config::load_from_file(&party_path);
    let offered = party.to_record()?;

    let status = Arc::new(StatusCell::new());
    let pending = Arc::new(PendingTasks::new());
    let mut session = Session::enter(
        offered.clone(),
        Arc::new(RawSpecies),
        status,
        pending.clone(),
    );

    let session = match args.command {
        Command::Bgb { listen, connect } => {
            let mode = connect.unwrap_or(BridgeMode::Listen {
                port: listen.unwrap_or(bgb::DEFAULT_PORT),
            });
            run_bgb(mode, session, pending)?
        }
        Command::Replay { file } => {
            run_replay(&file, &mut session, &pending)?;
            session
        }
    };

    let local = session.leave();
    if local == offered {
        return Ok(());
    }

    let received = PartyConfig::from_record(&local)?;
    println!(
        "Traded for {} (species 0x{:02X}, level {})",
        received.pokemon.nickname, received.pokemon.species, received.pokemon.level
    );
    if args.save {
        config::save_to_file(&party_path, &received)?;
        info!("Saved traded pokemon to {}", party_path.display());
    } else {
        warn!("Traded pokemon not saved; pass --save to keep it");
    }
    Ok(())
}
