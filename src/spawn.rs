use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::IntelligenceKind;
use crate::components::{ObjectId, Orientation};
use crate::inventory::GameConditionList;
use crate::movement::circular::{CircularMovementProvider, OrbitConfig};
use crate::movement::directed::{DirectedMovementProvider, Director};
use crate::movement::projectile::LinearProjectileMovementProvider;
use crate::movement::run_and_jump::{RunAndJumpMovementProvider, RunnerTuning};
use crate::movement::{MovementProvider, ProviderKind};
use crate::obstacle::{RoomObject, ShooterConfig};
use crate::room::Room;
use crate::surface::{Direction, SurfaceInformation, SurfaceSet};
use crate::terrain::{Terrain, TerrainShape};
use crate::tilemap::{GridMode, TileGrid, TileTemplate};

/// Which movement provider a template's objects get.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    #[default]
    None,
    RunAndJump {
        #[serde(default)]
        tuning: RunnerTuning,
        #[serde(default)]
        intelligence: IntelligenceKind,
    },
    Circular {
        #[serde(default)]
        orbit: OrbitConfig,
    },
    Directed,
    LinearProjectile {
        velocity: Vec2,
        #[serde(default = "default_projectile_death_duration")]
        death_duration: u32,
    },
}

fn default_projectile_death_duration() -> u32 {
    10
}

impl ProviderConfig {
    pub fn build(&self, conditions: &GameConditionList) -> Option<MovementProvider> {
        let kind = match self {
            ProviderConfig::None => return None,
            ProviderConfig::RunAndJump {
                tuning,
                intelligence,
            } => ProviderKind::RunAndJump(RunAndJumpMovementProvider::new(
                tuning.clone(),
                intelligence.clone(),
            )),
            ProviderConfig::Circular { orbit } => {
                ProviderKind::Circular(CircularMovementProvider::new(*orbit))
            }
            ProviderConfig::Directed => ProviderKind::Directed(DirectedMovementProvider::default()),
            ProviderConfig::LinearProjectile {
                velocity,
                death_duration,
            } => ProviderKind::LinearProjectile(LinearProjectileMovementProvider::new(
                *velocity,
                *death_duration,
            )),
        };
        Some(MovementProvider::new(kind, conditions.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    pub name: String,
    pub size: Vec2,
    #[serde(default)]
    pub surfaces: SurfaceSet,
    #[serde(default)]
    pub collidable: bool,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Collectible conditions gating the provider.
    #[serde(default)]
    pub conditions: GameConditionList,
    #[serde(default)]
    pub shooter: Option<ShooterConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub template: String,
    /// Overrides the template name for this instance.
    #[serde(default)]
    pub name: Option<String>,
    pub position: Vec2,
    #[serde(default)]
    pub velocity: Vec2,
    #[serde(default)]
    pub main_character: bool,
    #[serde(default)]
    pub children: Vec<ObjectPlacement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub x: i32,
    pub y: i32,
    pub template: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub name: String,
    pub tile_size: Vec2,
    /// Zero means "as wide as the longest text row".
    pub columns: usize,
    pub rows: usize,
    pub origin: Vec2,
    pub mode: GridMode,
    pub active: bool,
    /// One string per row; `.` and space are empty cells, any other
    /// character is looked up in `legend`.
    pub rows_text: Vec<String>,
    pub legend: HashMap<String, String>,
    pub tiles: Vec<TilePlacement>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            tile_size: Vec2::splat(16.0),
            columns: 0,
            rows: 0,
            origin: Vec2::ZERO,
            mode: GridMode::Static,
            active: false,
            rows_text: Vec::new(),
            legend: HashMap::new(),
            tiles: Vec::new(),
        }
    }
}

/// Content description of a room, usually loaded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub tile_templates: Vec<TileTemplate>,
    pub object_templates: Vec<ObjectTemplate>,
    pub grids: Vec<GridConfig>,
    pub objects: Vec<ObjectPlacement>,
    pub terrains: Vec<Terrain>,
    pub directors: Vec<Director>,
    pub viscosity: f32,
    /// Collectibles held when the room starts.
    pub collectibles: HashMap<String, u32>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tile_templates: Vec::new(),
            object_templates: Vec::new(),
            grids: Vec::new(),
            objects: Vec::new(),
            terrains: Vec::new(),
            directors: Vec::new(),
            viscosity: 1.0,
            collectibles: HashMap::new(),
        }
    }
}

pub fn parse_room_config(json: &str) -> Result<RoomConfig, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid room config: {e}"))
}

pub fn load_room_config(path: &str) -> Result<RoomConfig, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("Cannot read room file {path}: {e}"))?;
    parse_room_config(&text)
}

/// Resolve templates and build a ready-to-step room.
pub fn build_room(config: &RoomConfig) -> Result<Room, String> {
    if !config.viscosity.is_finite() || config.viscosity < 0.0 {
        return Err(format!(
            "Room viscosity must be a non-negative number, got {}",
            config.viscosity
        ));
    }

    let mut tiles: HashMap<&str, Arc<TileTemplate>> = HashMap::new();
    for template in &config.tile_templates {
        if tiles
            .insert(template.name.as_str(), Arc::new(template.clone()))
            .is_some()
        {
            return Err(format!("Duplicate tile template '{}'", template.name));
        }
    }
    let mut objects: HashMap<&str, &ObjectTemplate> = HashMap::new();
    for template in &config.object_templates {
        if template.size.x <= 0.0 || template.size.y <= 0.0 {
            return Err(format!(
                "Object template '{}' needs a positive size",
                template.name
            ));
        }
        if objects.insert(template.name.as_str(), template).is_some() {
            return Err(format!("Duplicate object template '{}'", template.name));
        }
    }

    let mut room = Room::default();
    room.viscosity = config.viscosity;

    for grid in &config.grids {
        room.grids.push(build_grid(grid, &tiles)?);
    }
    room.active_grid = pick_active_grid(config)?;

    for placement in &config.objects {
        place_object(&mut room, &objects, placement, None)?;
    }

    for grid in &room.grids {
        if let GridMode::FollowObject { object, .. } = grid.mode {
            if room.objects.get(object).is_none() {
                return Err(format!(
                    "Grid '{}' follows object {} which does not exist",
                    grid.name, object.0
                ));
            }
        }
    }

    for (i, terrain) in config.terrains.iter().enumerate() {
        if let TerrainShape::Wave { wavelength, .. } = terrain.shape {
            if wavelength <= 0.0 {
                return Err(format!("Terrain {i} needs a positive wavelength"));
            }
        }
    }
    room.terrains = config.terrains.clone();
    room.directors = config.directors.clone();
    room.store.items = config.collectibles.clone();

    info!(
        "[Runbound room] Built room: {} grids, {} tiles, {} objects, {} terrains, {} directors",
        room.grids.len(),
        room.grids.iter().map(TileGrid::tile_count).sum::<usize>(),
        room.objects.len(),
        room.terrains.len(),
        room.directors.len(),
    );
    Ok(room)
}

fn build_grid(
    config: &GridConfig,
    tiles: &HashMap<&str, Arc<TileTemplate>>,
) -> Result<TileGrid, String> {
    if config.tile_size.x <= 0.0 || config.tile_size.y <= 0.0 {
        return Err(format!("Grid '{}' needs a positive tile size", config.name));
    }
    let widest = config
        .rows_text
        .iter()
        .map(|row| row.chars().count())
        .max()
        .unwrap_or(0);
    let columns = if config.columns > 0 {
        config.columns
    } else {
        widest
    };
    let rows = config.rows.max(config.rows_text.len());
    if columns == 0 || rows == 0 {
        return Err(format!("Grid '{}' has no cells", config.name));
    }
    if widest > columns {
        return Err(format!(
            "Grid '{}' has a row of {} cells but only {} columns",
            config.name, widest, columns
        ));
    }

    let mut legend: HashMap<char, Arc<TileTemplate>> = HashMap::new();
    for (key, template) in &config.legend {
        let mut chars = key.chars();
        let (Some(symbol), None) = (chars.next(), chars.next()) else {
            return Err(format!(
                "Grid '{}' legend key '{}' must be a single character",
                config.name, key
            ));
        };
        legend.insert(symbol, resolve_tile(tiles, template)?);
    }

    let mut grid = TileGrid::new(config.name.clone(), columns, rows, config.tile_size)
        .with_origin(config.origin)
        .with_mode(config.mode);

    for (y, row) in config.rows_text.iter().enumerate() {
        for (x, symbol) in row.chars().enumerate() {
            if symbol == '.' || symbol == ' ' {
                continue;
            }
            let Some(template) = legend.get(&symbol) else {
                return Err(format!(
                    "Grid '{}' row {} uses '{}' which is not in the legend",
                    config.name, y, symbol
                ));
            };
            grid.set_tile(x as i32, y as i32, template.clone());
        }
    }

    for tile in &config.tiles {
        let template = resolve_tile(tiles, &tile.template)?;
        if !grid.set_tile(tile.x, tile.y, template) {
            return Err(format!(
                "Grid '{}' has no cell ({}, {})",
                config.name, tile.x, tile.y
            ));
        }
    }
    Ok(grid)
}

fn resolve_tile(
    tiles: &HashMap<&str, Arc<TileTemplate>>,
    name: &str,
) -> Result<Arc<TileTemplate>, String> {
    tiles
        .get(name)
        .cloned()
        .ok_or_else(|| format!("Unknown tile template '{name}'"))
}

/// The flagged grid, else the first static one.
fn pick_active_grid(config: &RoomConfig) -> Result<Option<usize>, String> {
    let flagged: Vec<usize> = config
        .grids
        .iter()
        .enumerate()
        .filter(|(_, g)| g.active)
        .map(|(i, _)| i)
        .collect();
    match flagged.as_slice() {
        [] => Ok(config
            .grids
            .iter()
            .position(|g| g.mode == GridMode::Static)),
        [one] => Ok(Some(*one)),
        _ => Err(format!(
            "Only one grid can be active, found {}",
            flagged.len()
        )),
    }
}

fn place_object(
    room: &mut Room,
    templates: &HashMap<&str, &ObjectTemplate>,
    placement: &ObjectPlacement,
    parent: Option<ObjectId>,
) -> Result<ObjectId, String> {
    let Some(template) = templates.get(placement.template.as_str()) else {
        return Err(format!(
            "Unknown object template '{}'",
            placement.template
        ));
    };
    let object = instantiate(template, placement);
    let id = match parent {
        Some(parent) => room.add_child(parent, object),
        None => room.add_object(object),
    };

    if placement.main_character {
        if let Some(existing) = room.main_character {
            return Err(format!(
                "Room has two main characters: '{}' and '{}'",
                room.objects[existing].name, room.objects[id].name
            ));
        }
        room.main_character = Some(id);
    }

    for child in &placement.children {
        place_object(room, templates, child, Some(id))?;
    }
    Ok(id)
}

fn instantiate(template: &ObjectTemplate, placement: &ObjectPlacement) -> RoomObject {
    let name = placement
        .name
        .clone()
        .unwrap_or_else(|| template.name.clone());
    let mut object = RoomObject::new(name, placement.position, template.size)
        .with_velocity(placement.velocity)
        .with_surfaces(template.surfaces)
        .collidable(template.collidable);
    if let Some(provider) = template.provider.build(&template.conditions) {
        object = object.with_provider(provider);
    }
    if let Some(shooter) = &template.shooter {
        object = object.with_shooter(shooter.clone());
    }
    object
}

impl RoomConfig {
    /// Built-in room used when no room file is given: a walled box with a
    /// ledge, a pit, a spike, a patrolling walker and an orbiting platform.
    pub fn test_room() -> Self {
        let spikes = TileTemplate {
            name: "spikes".to_string(),
            surfaces: SurfaceSet::uniform(SurfaceInformation {
                is_solid: true,
                offense: 10.0,
                ..SurfaceInformation::empty(Direction::Top)
            }),
            height: 0,
            acceleration: Vec2::ZERO,
        };

        let rows_text = [
            "################################",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#..............................#",
            "#.......#####..................#",
            "#..............................#",
            "#..............................#",
            "#.........................^....#",
            "####################..##########",
        ]
        .iter()
        .map(|row| row.to_string())
        .collect();

        let mut walker_surfaces = SurfaceSet::uniform(SurfaceInformation {
            is_solid: true,
            offense: 1.0,
            ..SurfaceInformation::empty(Direction::Top)
        });
        walker_surfaces.top = SurfaceInformation {
            is_solid: true,
            is_die: true,
            tangent_speed: 6.0,
            ..SurfaceInformation::empty(Direction::Top)
        };

        RoomConfig {
            tile_templates: vec![TileTemplate::solid("stone", 0.2), spikes],
            object_templates: vec![
                ObjectTemplate {
                    name: "hero".to_string(),
                    size: Vec2::new(12.0, 14.0),
                    surfaces: SurfaceSet::default(),
                    collidable: false,
                    provider: ProviderConfig::RunAndJump {
                        tuning: RunnerTuning::default(),
                        intelligence: IntelligenceKind::UserInput,
                    },
                    conditions: GameConditionList::default(),
                    shooter: Some(ShooterConfig {
                        projectile_surfaces: SurfaceSet::uniform(SurfaceInformation {
                            offense: 1.0,
                            ..SurfaceInformation::empty(Direction::Top)
                        }),
                        ..ShooterConfig::default()
                    }),
                },
                ObjectTemplate {
                    name: "walker".to_string(),
                    size: Vec2::new(14.0, 14.0),
                    surfaces: walker_surfaces,
                    collidable: true,
                    provider: ProviderConfig::RunAndJump {
                        tuning: RunnerTuning {
                            max_horizontal_speed: 1.5,
                            horizontal_acceleration: 0.3,
                            ..RunnerTuning::default()
                        },
                        intelligence: IntelligenceKind::TurnOnHoleOrCollision {
                            heading: Orientation::Left,
                        },
                    },
                    conditions: GameConditionList::default(),
                    shooter: None,
                },
                ObjectTemplate {
                    name: "platform".to_string(),
                    size: Vec2::new(32.0, 8.0),
                    surfaces: SurfaceSet::solid(0.3),
                    collidable: true,
                    provider: ProviderConfig::Circular {
                        orbit: OrbitConfig {
                            center_offset: Vec2::new(0.0, 2.0),
                            angular_speed: 0.03,
                            clockwise: true,
                        },
                    },
                    conditions: GameConditionList::default(),
                    shooter: None,
                },
            ],
            grids: vec![GridConfig {
                name: "main".to_string(),
                active: true,
                rows_text,
                legend: HashMap::from([
                    ("#".to_string(), "stone".to_string()),
                    ("^".to_string(), "spikes".to_string()),
                ]),
                ..GridConfig::default()
            }],
            objects: vec![
                ObjectPlacement {
                    template: "hero".to_string(),
                    name: None,
                    position: Vec2::new(32.0, 180.0),
                    velocity: Vec2::ZERO,
                    main_character: true,
                    children: Vec::new(),
                },
                ObjectPlacement {
                    template: "walker".to_string(),
                    name: None,
                    position: Vec2::new(150.0, 180.0),
                    velocity: Vec2::ZERO,
                    main_character: false,
                    children: Vec::new(),
                },
                ObjectPlacement {
                    template: "platform".to_string(),
                    name: None,
                    position: Vec2::new(96.0, 60.0),
                    velocity: Vec2::ZERO,
                    main_character: false,
                    children: Vec::new(),
                },
            ],
            ..RoomConfig::default()
        }
    }
}
