//! WhisperGate CLI
//!
//! Usage:
//!   whispergate                         # Scripted two-participant demo
//!   whispergate --frames 500            # Longer run
//!   whispergate --solo                  # Solo loopback check
//!   whispergate --serve                 # HTTP debug API server
//!   whispergate --json                  # JSON transition output

use clap::Parser;
use colored::Colorize;

use whispergate::core::journal::save_journal;
use whispergate::core::room::Room;
use whispergate::core::scenario::ScenarioPlayer;
use whispergate::core::run_server;
use whispergate::types::{PlayerId, RoomConfig};
use whispergate::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "whispergate",
    version = VERSION,
    about = "WhisperGate - proximity-gated private whisper channel",
    long_about = "WhisperGate simulates a shared space where one participant can\n\
                  whisper to one nearby ear.\n\n\
                  A hand cupped by the mouth next to another participant's ear\n\
                  flips the speaker into WHISPERING; the relay announces it, each\n\
                  receiver gates it by its own proximity, and a pooled voice gate\n\
                  mutes the speaker for everyone but the chosen ear.\n\n\
                  Modes:\n  \
                  (default)  Scripted two-participant demo\n  \
                  --solo     Single participant, loopback receive path\n  \
                  --serve    HTTP debug API server"
)]
struct Args {
    /// Run the scripted demo (default when no mode is given)
    #[arg(short, long)]
    simulate: bool,

    /// Solo loopback mode - one participant receiving its own signals
    #[arg(long)]
    solo: bool,

    /// Run as HTTP API server
    #[arg(long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Frames to simulate
    #[arg(long, default_value_t = 324)]
    frames: u32,

    /// Virtual seconds per frame (default: one 72 Hz frame)
    #[arg(long)]
    dt: Option<f32>,

    /// Output transitions as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Print the per-frame detector breakdown on transitions
    #[arg(long)]
    verbose: bool,

    /// Directory for session journals (default: ./journals)
    #[arg(long, default_value = "./journals")]
    journal_dir: String,

    /// Disable journal saving
    #[arg(long)]
    no_journal: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    if args.serve {
        run_serve(&args).await;
    } else if args.solo {
        run_solo(&args);
    } else if args.simulate {
        run_simulate(&args);
    } else {
        // Default to the demo if no mode specified
        run_simulate(&args);
    }
}

/// Scripted two-participant demo: stand apart, whisper, withdraw
fn run_simulate(args: &Args) {
    print_header("Demo");
    println!("alice whispers to bob for two seconds, then steps back.");
    println!();

    let mut room = Room::new(room_config(args));
    let alice = room.join("alice");
    let bob = room.join("bob");
    let mut player = ScenarioPlayer::demo(alice, bob);

    let mut tracker = TransitionTracker::new(vec![alice, bob]);
    for _ in 0..args.frames {
        player.step(&mut room);
        tracker.report(&room, args);
    }

    println!();
    println!("{}", room.render_gate_hud(bob).dimmed());
    print_summary(&room, alice, bob);
    finish_journal(room, args);
}

/// Solo loopback: one participant, debug-forced whisper, receiving its
/// own signals through the All-addressed broadcasts
fn run_solo(args: &Args) {
    print_header("Solo");
    println!("One participant, whisper forced on; signals loop back to self.");
    println!();

    let mut room = Room::new(room_config(args));
    let solo = room.join("solo");
    room.set_pose(
        solo,
        whispergate::core::scenario::whispering_speaker(whispergate::types::Vec3::new(
            0.0, 1.65, 0.0,
        )),
    );
    room.set_debug_forced(solo, true);

    let mut tracker = TransitionTracker::new(vec![solo]);
    for _ in 0..args.frames {
        room.tick();
        tracker.report(&room, args);
    }

    println!();
    print_summary(&room, solo, solo);
    finish_journal(room, args);
}

/// Run HTTP API server
async fn run_serve(args: &Args) {
    print_header("API Server");

    if let Err(e) = run_server(&args.addr).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Watches whisper/receive booleans and prints a line on every change
struct TransitionTracker {
    ids: Vec<PlayerId>,
    whispering: Vec<bool>,
    receiving: Vec<bool>,
}

impl TransitionTracker {
    fn new(ids: Vec<PlayerId>) -> Self {
        let n = ids.len();
        Self {
            ids,
            whispering: vec![false; n],
            receiving: vec![false; n],
        }
    }

    fn report(&mut self, room: &Room, args: &Args) {
        for (i, id) in self.ids.iter().enumerate() {
            let name = room
                .roster()
                .get(*id)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| id.to_string());

            let whispering = room.is_whispering(*id);
            if whispering != self.whispering[i] {
                self.whispering[i] = whispering;
                if args.json {
                    if let Some(out) = room.last_output(*id) {
                        println!("{}", serde_json::to_string(out).unwrap_or_default());
                    }
                } else {
                    let line = format!(
                        "t={:6.2}s  {:8}  {}",
                        room.now(),
                        name,
                        if whispering {
                            "🤫 WHISPERING".to_string()
                        } else {
                            "🔈 idle".to_string()
                        }
                    );
                    if whispering {
                        println!("{}", line.magenta());
                    } else {
                        println!("{}", line.dimmed());
                    }
                    if args.verbose {
                        if let Some(out) = room.last_output(*id) {
                            if args.no_color {
                                println!("  {}", out.to_parseable_string());
                            } else {
                                println!("  {}", out.to_terminal_string());
                            }
                        }
                    }
                }
            }

            let receiving = room.is_receiving(*id);
            if receiving != self.receiving[i] {
                self.receiving[i] = receiving;
                if args.json {
                    println!(
                        "{{\"t\":{:.3},\"participant\":{},\"receiving\":{}}}",
                        room.now(),
                        id,
                        receiving
                    );
                } else {
                    let status = room.receive_status(*id).unwrap_or("").to_string();
                    let line = format!("t={:6.2}s  {:8}  {}", room.now(), name, status);
                    if receiving {
                        println!("{}", line.cyan());
                    } else {
                        println!("{}", line.yellow());
                    }
                }
            }
        }
    }
}

fn room_config(args: &Args) -> RoomConfig {
    let mut cfg = RoomConfig::default();
    if let Some(dt) = args.dt {
        cfg.tick_dt = dt.max(1e-4);
    }
    cfg
}

fn print_header(mode: &str) {
    println!(
        "{}",
        format!("═══ WhisperGate v{} - {} ═══", VERSION, mode).bold()
    );
    println!();
}

fn print_summary(room: &Room, speaker: PlayerId, listener: PlayerId) {
    println!(
        "frames={}  t={:.2}s  whispering={}  receiving={}",
        room.frame(),
        room.now(),
        room.is_whispering(speaker),
        room.is_receiving(listener),
    );
}

fn finish_journal(room: Room, args: &Args) {
    let journal = room.into_journal();
    if args.no_journal {
        return;
    }
    match save_journal(&journal, &args.journal_dir) {
        Ok(path) => println!("{}", format!("journal saved: {}", path).dimmed()),
        Err(e) => eprintln!("journal save failed: {}", e),
    }
}
