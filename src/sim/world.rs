/// WorldState: the complete snapshot of a running game.
///
/// Two lifetimes of state live here:
///   - `Session` — survives room reloads (lives, key, treasure tally,
///     current room). Mutated only through the transition functions in
///     `sim::step`; physics and presentation read it.
///   - Per-room data — solid grid, entity list, player — torn down and
///     rebuilt wholesale by every `load_room`.

use crate::domain::entity::{Entity, Player};
use crate::domain::physics::{SolidGrid, Vec2};
use crate::sim::level::RoomDef;

pub const STARTING_LIVES: u32 = 3;
pub const TREASURES_PER_LIFE: u32 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    GameOver,
}

/// State that persists across room reloads (but not across a restart).
#[derive(Clone, Debug)]
pub struct Session {
    /// 1-based room number.
    pub current_room: usize,
    pub lives: u32,
    pub has_key: bool,
    pub treasures_collected: u32,
}

impl Session {
    pub fn new() -> Self {
        Session {
            current_room: 1,
            lives: STARTING_LIVES,
            has_key: false,
            treasures_collected: 0,
        }
    }
}

pub struct WorldState {
    // ── Room set (fixed at startup) ──
    pub rooms: Vec<RoomDef>,

    // ── Session ──
    pub session: Session,
    pub phase: Phase,

    // ── Per-room data (rebuilt by load_room) ──
    pub solid: SolidGrid,
    pub entities: Vec<Entity>,
    pub player: Player,
    pub platform_count: usize,
    /// Treasure entities placed when the room was loaded.
    pub total_treasures: usize,
    /// Pixel dimensions of the level.
    pub level_w: f32,
    pub level_h: f32,

    // ── Meta ──
    pub tick: u64,

    // ── UI message line ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(rooms: Vec<RoomDef>) -> Self {
        WorldState {
            rooms,
            session: Session::new(),
            phase: Phase::Title,
            solid: SolidGrid::default(),
            entities: vec![],
            player: Player::new(Vec2::default()),
            platform_count: 0,
            total_treasures: 0,
            level_w: 0.0,
            level_h: 0.0,
            tick: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}
