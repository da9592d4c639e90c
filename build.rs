//! Bakes an optional room file into the binary.
//!
//! `RUNBOUND_EMBED_ROOM_PATH` names a room JSON file. It is checked here so a
//! broken room fails the build instead of the first run. Without it the
//! binary embeds `{}`, which `main` reads as "no embedded room".

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

const EMBED_VAR: &str = "RUNBOUND_EMBED_ROOM_PATH";
const NO_ROOM: &str = "{}";
const LIST_SECTIONS: [&str; 6] = [
    "tile_templates",
    "object_templates",
    "grids",
    "objects",
    "terrains",
    "directors",
];

fn check_room(text: &str) -> Result<(), String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("not valid JSON: {e}"))?;
    let room = value
        .as_object()
        .ok_or("the top level must be a JSON object")?;
    for section in LIST_SECTIONS {
        if room.get(section).is_some_and(|v| !v.is_array()) {
            return Err(format!("'{section}' must be a list"));
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-env-changed={EMBED_VAR}");
    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let target = Path::new(&out_dir).join("runbound_embedded_room.json");

    let room = match env::var(EMBED_VAR).ok().filter(|p| !p.is_empty()) {
        Some(path) => {
            println!("cargo:rerun-if-changed={path}");
            let text = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read embedded room {path}: {e}"));
            if let Err(e) = check_room(&text) {
                panic!("embedded room {path} is unusable: {e}");
            }
            text
        }
        None => NO_ROOM.to_string(),
    };

    fs::write(&target, room)
        .unwrap_or_else(|e| panic!("cannot write {}: {e}", target.display()));
}
