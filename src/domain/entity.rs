/// Entities: the player plus everything a room places around them.
/// Kind-specific behavior (patrol speed, gravity affinity, overlap reach)
/// is queried via methods, not stored as flags, so the semantics are
/// centralized here.

use super::physics::Vec2;

/// Enemy subtypes with their fixed patrol speeds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    Mummy,
    Pharaoh,
    WingedAvatar,
}

impl EnemyKind {
    /// Initial horizontal patrol speed, pixels per second.
    pub fn patrol_speed(self) -> f32 {
        match self {
            EnemyKind::Mummy => 60.0,
            EnemyKind::Pharaoh => 80.0,
            EnemyKind::WingedAvatar => 100.0,
        }
    }

    /// Ground enemies fall; the winged avatar flies.
    pub fn gravity_affected(self) -> bool {
        !matches!(self, EnemyKind::WingedAvatar)
    }
}

/// Everything a room places besides walls and the player.
/// Walls are folded into the solid grid at build time; the rest carry
/// their payload here (a door knows its destination at creation).
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum EntityKind {
    Rope,
    Key,
    Door { next_room: usize },
    Treasure,
    Enemy(EnemyKind),
    Trap,
}

impl EntityKind {
    /// Half-extent of the overlap box. Doors and traps fill their tile;
    /// pickups and actors use the 28px sprite body.
    pub fn half_extent(self) -> f32 {
        match self {
            EntityKind::Door { .. } | EntityKind::Trap => 16.0,
            _ => 14.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Entity {
    /// Place an entity at a cell center. Enemies start patrolling
    /// rightward at their subtype speed; everything else is static.
    pub fn spawn(kind: EntityKind, pos: Vec2) -> Self {
        let vel = match kind {
            EntityKind::Enemy(e) => Vec2::new(e.patrol_speed(), 0.0),
            _ => Vec2::default(),
        };
        Entity { kind, pos, vel }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub grounded: bool,
    pub on_rope: bool,
    /// Milliseconds of continuous running; jumping needs a run-up.
    pub run_time_ms: f32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Player {
            pos,
            vel: Vec2::default(),
            grounded: false,
            on_rope: false,
            run_time_ms: 0.0,
        }
    }
}

/// Held-key state sampled at tick start.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_subtype_speeds() {
        assert_eq!(EnemyKind::Mummy.patrol_speed(), 60.0);
        assert_eq!(EnemyKind::Pharaoh.patrol_speed(), 80.0);
        assert_eq!(EnemyKind::WingedAvatar.patrol_speed(), 100.0);
    }

    #[test]
    fn only_the_winged_avatar_flies() {
        assert!(EnemyKind::Mummy.gravity_affected());
        assert!(EnemyKind::Pharaoh.gravity_affected());
        assert!(!EnemyKind::WingedAvatar.gravity_affected());
    }

    #[test]
    fn spawn_sets_patrol_velocity() {
        let e = Entity::spawn(EntityKind::Enemy(EnemyKind::Pharaoh), Vec2::new(48.0, 48.0));
        assert_eq!(e.vel.x, 80.0);
        assert_eq!(e.vel.y, 0.0);

        let k = Entity::spawn(EntityKind::Key, Vec2::new(48.0, 48.0));
        assert_eq!(k.vel, Vec2::default());
    }

    #[test]
    fn doors_and_traps_fill_their_tile() {
        assert_eq!(EntityKind::Door { next_room: 2 }.half_extent(), 16.0);
        assert_eq!(EntityKind::Trap.half_extent(), 16.0);
        assert_eq!(EntityKind::Key.half_extent(), 14.0);
        assert_eq!(EntityKind::Enemy(EnemyKind::Mummy).half_extent(), 14.0);
    }
}
