use bevy::prelude::*;

use runbound::physics::MovementPlugin;
use runbound::room::Room;
use runbound::simulation::{run_simulation, SimulationRequest};
use runbound::spawn::{build_room, load_room_config, parse_room_config, RoomConfig};

const EMBEDDED_ROOM: &str =
    include_str!(concat!(env!("OUT_DIR"), "/runbound_embedded_room.json"));

const DEFAULT_FRAMES: u32 = 600;

#[derive(Default)]
struct CliArgs {
    room_path: Option<String>,
    simulate: Option<String>,
    frames: Option<u32>,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--simulate" => {
                cli.simulate = Some(args.next().ok_or("--simulate needs a request file")?);
            }
            "--frames" => {
                let value = args.next().ok_or("--frames needs a number")?;
                let frames = value
                    .parse::<u32>()
                    .map_err(|e| format!("Invalid --frames value {value}: {e}"))?;
                cli.frames = Some(frames);
            }
            other if other.starts_with("--") => return Err(format!("Unknown flag {other}")),
            _ => cli.room_path = Some(arg),
        }
    }
    Ok(cli)
}

/// CLI path, then `RUNBOUND_ROOM`, then `room.json`, then the embedded room,
/// then the built-in test room.
fn load_room(cli_path: Option<String>) -> Result<RoomConfig, String> {
    let explicit = cli_path.or_else(|| {
        std::env::var("RUNBOUND_ROOM")
            .ok()
            .filter(|s| !s.is_empty())
    });
    if let Some(path) = explicit {
        let config = load_room_config(&path)?;
        println!("[Runbound] Loaded room from {}", path);
        return Ok(config);
    }
    if std::path::Path::new("room.json").exists() {
        let config = load_room_config("room.json")?;
        println!("[Runbound] Loaded room from room.json");
        return Ok(config);
    }
    if EMBEDDED_ROOM.trim() != "{}" {
        let config = parse_room_config(EMBEDDED_ROOM)?;
        println!("[Runbound] Using embedded room");
        return Ok(config);
    }
    println!("[Runbound] No room file found, using the built-in test room");
    Ok(RoomConfig::test_room())
}

fn simulate(request_path: &str, fallback: RoomConfig) -> Result<String, String> {
    let text = std::fs::read_to_string(request_path)
        .map_err(|e| format!("Cannot read simulation request {request_path}: {e}"))?;
    let request: SimulationRequest = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid simulation request: {e}"))?;
    request.validate()?;
    let config = request.room.clone().unwrap_or(fallback);
    let mut room = build_room(&config)?;
    let result = run_simulation(&mut room, &request);
    serde_json::to_string_pretty(&result).map_err(|e| format!("Cannot encode result: {e}"))
}

fn run_headless(config: &RoomConfig, frames: u32) -> Result<(), String> {
    let room = build_room(config)?;
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(bevy::log::LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(room)
        .add_plugins(MovementPlugin);
    println!("[Runbound] Stepping {} frames headless", frames);

    for _ in 0..frames {
        app.world_mut().run_schedule(FixedUpdate);
    }

    let room = app.world().resource::<Room>();
    for (id, object) in room.objects.iter() {
        println!(
            "[Runbound] #{} {}: ({:.2}, {:.2}) v=({:.2}, {:.2}) {:?} {}",
            id.0,
            object.name,
            object.position.x,
            object.position.y,
            object.velocity.x,
            object.velocity.y,
            object.life,
            object.action_state,
        );
    }
    Ok(())
}

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("[Runbound] {e}");
            std::process::exit(2);
        }
    };
    let config = match load_room(cli.room_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[Runbound] {e}");
            std::process::exit(1);
        }
    };

    if let Some(request_path) = cli.simulate {
        match simulate(&request_path, config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("[Runbound] Simulation failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run_headless(&config, cli.frames.unwrap_or(DEFAULT_FRAMES)) {
        eprintln!("[Runbound] {e}");
        std::process::exit(1);
    }
}
