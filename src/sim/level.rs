/// Room definitions and the room builder.
///
/// ## Sources (priority order):
///   1. External rooms file (path from `config.toml`, searched in the
///      exe directory then the CWD)
///   2. Built-in rooms
///
/// ## Rooms file format:
///   ```
///   # Room name (optional)
///   <grid rows>
///   ---
///   # Next room
///   <grid rows>
///   ```
///   Rooms are separated by a line containing only `---`. Rows have
///   trailing whitespace trimmed, blank rows dropped, and are right-padded
///   to the longest row in the room.
///
/// ## Tile legend:
///   '#' = wall          'R' = rope        'K' = key
///   'D' = door          '$' = treasure    'T' = trap
///   'M' = mummy         'F' = pharaoh     'W' = winged avatar
///   'P' = player spawn   anything else = empty floor

use std::fmt;

use crate::config::GameConfig;
use crate::domain::entity::{EnemyKind, Entity, EntityKind, Player};
use crate::domain::physics::{cell_center, SolidGrid, TILE_SIZE};
use crate::sim::world::WorldState;

/// One room layout, immutable once loaded.
#[derive(Clone, Debug)]
pub struct RoomDef {
    pub name: String,
    pub rows: Vec<String>,
}

/// A room number with no defined layout is a configuration error:
/// fatal, never silently defaulted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoomError {
    Undefined(usize),
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomError::Undefined(n) => write!(f, "room {n} has no defined layout"),
        }
    }
}

impl std::error::Error for RoomError {}

// ══════════════════════════════════════════════════════════════
// Room set loading
// ══════════════════════════════════════════════════════════════

/// Load the room set: external rooms file if present and non-empty,
/// otherwise the built-in rooms.
pub fn load_rooms(config: &GameConfig) -> Vec<RoomDef> {
    for dir in &config.search_dirs {
        let path = dir.join(&config.rooms_file);
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let rooms = parse_room_set(&content);
                if !rooms.is_empty() {
                    return rooms;
                }
                eprintln!(
                    "Warning: {} contains no rooms, using built-in set.",
                    path.display()
                );
            }
            Err(e) => {
                eprintln!("Warning: could not read {}: {e}", path.display());
            }
        }
    }
    builtin_rooms()
}

/// Progression rule: doors lead to the next room, wrapping back to 1
/// after the last defined room. Fixed at room-load time.
pub fn next_room(current: usize, total: usize) -> usize {
    if current < total {
        current + 1
    } else {
        1
    }
}

// ══════════════════════════════════════════════════════════════
// Room builder
// ══════════════════════════════════════════════════════════════

/// Tear down the previous room's entities and build room `number` fresh.
/// Session fields (lives, key, treasure tally) are untouched apart from
/// `current_room`; everything per-room is recomputed.
pub fn load_room(world: &mut WorldState, number: usize) -> Result<(), RoomError> {
    let def = world
        .rooms
        .get(number.wrapping_sub(1))
        .ok_or(RoomError::Undefined(number))?
        .clone();
    let total = world.rooms.len();

    let height = def.rows.len();
    let width = def.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    world.session.current_room = number;
    world.solid = SolidGrid::new(width, height);
    world.entities.clear();
    world.platform_count = 0;
    world.total_treasures = 0;
    world.level_w = width as f32 * TILE_SIZE;
    world.level_h = height as f32 * TILE_SIZE;
    world.tick = 0;

    let mut spawn = cell_center(1, 1);

    for (row, line) in def.rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let pos = cell_center(col, row);
            match ch {
                '#' => {
                    world.solid.set(col, row);
                    world.platform_count += 1;
                }
                'R' => world.entities.push(Entity::spawn(EntityKind::Rope, pos)),
                'K' => world.entities.push(Entity::spawn(EntityKind::Key, pos)),
                'D' => world.entities.push(Entity::spawn(
                    EntityKind::Door { next_room: next_room(number, total) },
                    pos,
                )),
                '$' => {
                    world.entities.push(Entity::spawn(EntityKind::Treasure, pos));
                    world.total_treasures += 1;
                }
                'M' => world
                    .entities
                    .push(Entity::spawn(EntityKind::Enemy(EnemyKind::Mummy), pos)),
                'F' => world
                    .entities
                    .push(Entity::spawn(EntityKind::Enemy(EnemyKind::Pharaoh), pos)),
                'W' => world
                    .entities
                    .push(Entity::spawn(EntityKind::Enemy(EnemyKind::WingedAvatar), pos)),
                'T' => world.entities.push(Entity::spawn(EntityKind::Trap, pos)),
                // Last spawn marker wins; a well-formed room has one.
                'P' => spawn = pos,
                _ => {}
            }
        }
    }

    world.player = Player::new(spawn);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a `---`-separated set of room grids.
pub fn parse_room_set(content: &str) -> Vec<RoomDef> {
    let mut rooms = vec![];
    let mut section = String::new();

    for line in content.lines() {
        if line.trim() == "---" {
            if let Some(def) = parse_room_grid(&section) {
                rooms.push(def);
            }
            section.clear();
        } else {
            section.push_str(line);
            section.push('\n');
        }
    }
    if let Some(def) = parse_room_grid(&section) {
        rooms.push(def);
    }

    rooms
}

/// Parse a single room grid. Returns None for an empty section.
fn parse_room_grid(content: &str) -> Option<RoomDef> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];

    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') && name.is_empty() && is_name_line(trimmed) {
            name = trimmed[1..].trim().to_string();
            continue;
        }
        rows.push(trimmed.to_string());
    }

    if rows.is_empty() {
        return None;
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Chamber".to_string();
    }

    Some(RoomDef { name, rows })
}

/// Distinguish `# Room Name` from `####...` (wall data). A name line
/// starts with `#` and contains at least one letter that is not a
/// tile-legend character.
fn is_name_line(line: &str) -> bool {
    line[1..]
        .chars()
        .any(|c| c.is_alphabetic() && !"RKDTMFWP".contains(c))
}

// ══════════════════════════════════════════════════════════════
// Built-in rooms
// ══════════════════════════════════════════════════════════════

pub fn builtin_rooms() -> Vec<RoomDef> {
    vec![
        make_room("Antechamber", &[
            "########################",
            "#......................#",
            "#.....K................#",
            "#..######..............#",
            "#......................#",
            "#.....R......M.........#",
            "#P....R..............D.#",
            "########################",
            "########################",
        ]),
        make_room("Treasure Vault", &[
            "########################",
            "#......................#",
            "#P........W............#",
            "#...$$$$$..............#",
            "#...######.............#",
            "#.........M............#",
            "#......R...............#",
            "#......R..........####D#",
            "########################",
            "########################",
        ]),
        make_room("Burial Chamber", &[
            "########################",
            "#......................#",
            "#P...K.................#",
            "#..####................#",
            "#......................#",
            "#.....F.....M..........#",
            "#.....R................#",
            "########################",
            "########################",
        ]),
    ]
}

fn make_room(name: &str, rows: &[&str]) -> RoomDef {
    RoomDef {
        name: name.to_string(),
        rows: rows.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::WorldState;

    fn loaded(number: usize) -> WorldState {
        let mut world = WorldState::new(builtin_rooms());
        load_room(&mut world, number).unwrap();
        world
    }

    #[test]
    fn every_builtin_room_has_one_spawn() {
        for def in builtin_rooms() {
            let spawns: usize = def
                .rows
                .iter()
                .map(|r| r.chars().filter(|&c| c == 'P').count())
                .sum();
            assert_eq!(spawns, 1, "room {:?}", def.name);
        }
    }

    #[test]
    fn treasure_total_matches_placed_treasures() {
        let rooms = builtin_rooms();
        for number in 1..=rooms.len() {
            let world = loaded(number);
            let placed = world
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Treasure)
                .count();
            assert_eq!(world.total_treasures, placed);
        }
    }

    #[test]
    fn door_destination_wraps_after_last_room() {
        assert_eq!(next_room(1, 3), 2);
        assert_eq!(next_room(2, 3), 3);
        assert_eq!(next_room(3, 3), 1);

        // Fixed at load time on the entity itself.
        let world = loaded(3);
        let door = world
            .entities
            .iter()
            .find_map(|e| match e.kind {
                EntityKind::Door { next_room } => Some(next_room),
                _ => None,
            })
            .unwrap();
        assert_eq!(door, 1);
    }

    #[test]
    fn undefined_room_is_a_fatal_error() {
        let mut world = WorldState::new(builtin_rooms());
        assert_eq!(load_room(&mut world, 0), Err(RoomError::Undefined(0)));
        assert_eq!(load_room(&mut world, 99), Err(RoomError::Undefined(99)));
    }

    #[test]
    fn cells_are_pixel_centered() {
        // Room 1 key sits at col 6, row 2.
        let world = loaded(1);
        let key = world
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Key)
            .unwrap();
        assert_eq!(key.pos.x, 6.0 * 32.0 + 16.0);
        assert_eq!(key.pos.y, 2.0 * 32.0 + 16.0);
    }

    #[test]
    fn parse_pads_ragged_rows_and_drops_blanks() {
        let set = parse_room_set("# First\n####\n#P.$#\n\n####\n---\n#P#\n###\n");
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].name, "First");
        // All rows padded to the widest (5).
        assert!(set[0].rows.iter().all(|r| r.chars().count() == 5));
        assert_eq!(set[0].rows.len(), 3);
        assert_eq!(set[1].name, "Chamber");
    }

    #[test]
    fn unknown_characters_are_empty_floor() {
        let set = parse_room_set("#P?*!#\n######\n");
        let mut world = WorldState::new(set);
        load_room(&mut world, 1).unwrap();
        assert!(world.entities.is_empty());
        assert_eq!(world.platform_count, 8);
    }

    #[test]
    fn room_load_records_dimensions_and_platforms() {
        let world = loaded(1);
        assert_eq!(world.level_w, 24.0 * 32.0);
        assert_eq!(world.level_h, 9.0 * 32.0);
        assert!(world.platform_count > 0);
        // Spawn at the P cell (col 1, row 6).
        assert_eq!(world.player.pos.x, 1.0 * 32.0 + 16.0);
        assert_eq!(world.player.pos.y, 6.0 * 32.0 + 16.0);
    }
}
