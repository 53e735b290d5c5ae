/// Continuous physics over a tile-occupancy grid.
///
/// ## Architecture
///
/// Positions and velocities are pixel-space `f32` (y grows downward);
/// platforms live in a boolean occupancy grid (`SolidGrid`) so collision
/// queries are O(1) per cell instead of a scan over platform entities.
///
/// Collision is axis-separated: integrate X, resolve against the cells the
/// body now overlaps, then the same for Y. A body therefore reports at most
/// one horizontal contact per tick — the side it is moving toward — which
/// makes enemy wall-bounce deterministic with no simultaneous-sides case.
///
/// ## Bounds
///
/// Outside the grid: side columns and rows above the top are solid (the
/// room clamps left/right/up), rows below the bottom are open so a falling
/// body can leave the level and take the fall-off-world path.

use super::entity::FrameInput;

// ── Behavioral constants ──
// Fixed, not configurable: gameplay parity depends on these exact values.

pub const TILE_SIZE: f32 = 32.0;
pub const GRAVITY: f32 = 800.0;
pub const RUN_SPEED: f32 = 200.0;
pub const JUMP_VELOCITY: f32 = -400.0;
pub const CLIMB_SPEED: f32 = 150.0;
pub const RUN_BEFORE_JUMP_MS: f32 = 300.0;
pub const ROPE_RANGE: f32 = 20.0;
pub const FALL_MARGIN: f32 = 100.0;

/// Half-extent of the player and enemy collision boxes (28px body).
pub const ACTOR_HALF: f32 = 14.0;

/// Skin width keeps a snapped body from re-registering against the
/// surface it rests on.
const SKIN: f32 = 0.01;

// ── Vec2 ──

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

/// Pixel center of a grid cell.
pub fn cell_center(col: usize, row: usize) -> Vec2 {
    Vec2::new(
        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
    )
}

fn tile_index(v: f32) -> i32 {
    (v / TILE_SIZE).floor() as i32
}

// ── Solid grid ──

/// Platform occupancy, one bool per tile cell.
#[derive(Clone, Debug, Default)]
pub struct SolidGrid {
    pub width: usize,
    pub height: usize,
    cells: Vec<bool>,
}

impl SolidGrid {
    pub fn new(width: usize, height: usize) -> Self {
        SolidGrid { width, height, cells: vec![false; width * height] }
    }

    pub fn set(&mut self, col: usize, row: usize) {
        if col < self.width && row < self.height {
            self.cells[row * self.width + col] = true;
        }
    }

    /// Is (col, row) solid? Out-of-bounds rule: sides and ceiling are
    /// walls, below the bottom row is open.
    #[inline]
    pub fn is_solid(&self, col: i32, row: i32) -> bool {
        if col < 0 || col >= self.width as i32 {
            return true;
        }
        if row < 0 {
            return true;
        }
        if row >= self.height as i32 {
            return false;
        }
        self.cells[row as usize * self.width + col as usize]
    }
}

// ── Collision resolution ──

/// Which sides of a body touched solid geometry during a tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Contacts {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Integrate one tick of motion and resolve against the solid grid.
///
/// Horizontal contact snaps the position flush to the wall but leaves
/// `vel.x` untouched (patrol AI reverses it, player input rewrites it).
/// Vertical contact snaps and zeroes `vel.y`; a down contact is the
/// grounded condition.
pub fn move_and_collide(
    grid: &SolidGrid,
    pos: &mut Vec2,
    vel: &mut Vec2,
    half: f32,
    dt: f32,
) -> Contacts {
    let mut contacts = Contacts::default();

    // Horizontal pass
    pos.x += vel.x * dt;
    let row0 = tile_index(pos.y - half + SKIN);
    let row1 = tile_index(pos.y + half - SKIN);
    if vel.x > 0.0 {
        let col = tile_index(pos.x + half - SKIN);
        if (row0..=row1).any(|r| grid.is_solid(col, r)) {
            pos.x = col as f32 * TILE_SIZE - half;
            contacts.right = true;
        }
    } else if vel.x < 0.0 {
        let col = tile_index(pos.x - half + SKIN);
        if (row0..=row1).any(|r| grid.is_solid(col, r)) {
            pos.x = (col + 1) as f32 * TILE_SIZE + half;
            contacts.left = true;
        }
    }

    // Vertical pass
    pos.y += vel.y * dt;
    let col0 = tile_index(pos.x - half + SKIN);
    let col1 = tile_index(pos.x + half - SKIN);
    if vel.y > 0.0 {
        let row = tile_index(pos.y + half - SKIN);
        if (col0..=col1).any(|c| grid.is_solid(c, row)) {
            pos.y = row as f32 * TILE_SIZE - half;
            vel.y = 0.0;
            contacts.down = true;
        }
    } else if vel.y < 0.0 {
        let row = tile_index(pos.y - half + SKIN);
        if (col0..=col1).any(|c| grid.is_solid(c, row)) {
            pos.y = (row + 1) as f32 * TILE_SIZE + half;
            vel.y = 0.0;
            contacts.up = true;
        }
    }

    contacts
}

/// Move without collision, clamped to level bounds. Used while the player
/// climbs: a rope lets the body pass through platform gaps.
pub fn move_free(pos: &mut Vec2, vel: Vec2, half: f32, level_w: f32, dt: f32) {
    pos.x = (pos.x + vel.x * dt).clamp(half, level_w - half);
    pos.y = (pos.y + vel.y * dt).max(half);
}

// ── Queries ──

/// Axis-aligned overlap between two centered boxes.
#[inline]
pub fn overlaps(a: Vec2, a_half: f32, b: Vec2, b_half: f32) -> bool {
    let reach = a_half + b_half;
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}

/// Rope proximity is purely horizontal: the climbable zone spans the full
/// height of the rope's column.
#[inline]
pub fn near_rope(player_x: f32, rope_x: f32) -> bool {
    (player_x - rope_x).abs() < ROPE_RANGE
}

/// Horizontal velocity the held directional keys ask for.
#[inline]
pub fn run_velocity(input: FrameInput) -> f32 {
    if input.left {
        -RUN_SPEED
    } else if input.right {
        RUN_SPEED
    } else {
        0.0
    }
}

/// Vertical climb velocity while on a rope.
#[inline]
pub fn climb_velocity(input: FrameInput) -> f32 {
    if input.up {
        -CLIMB_SPEED
    } else if input.down {
        CLIMB_SPEED
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    /// 5x4 box: walls all around, open 3x2 interior.
    fn boxed_grid() -> SolidGrid {
        let mut g = SolidGrid::new(5, 4);
        for col in 0..5 {
            g.set(col, 0);
            g.set(col, 3);
        }
        for row in 0..4 {
            g.set(0, row);
            g.set(4, row);
        }
        g
    }

    #[test]
    fn falling_body_lands_and_grounds() {
        let g = boxed_grid();
        let mut pos = cell_center(2, 1);
        let mut vel = Vec2::default();

        let mut grounded = false;
        for _ in 0..120 {
            vel.y += GRAVITY * DT;
            let c = move_and_collide(&g, &mut pos, &mut vel, ACTOR_HALF, DT);
            if c.down {
                grounded = true;
                break;
            }
        }
        assert!(grounded);
        // Bottom edge flush with the floor row (row 3, top at y=96).
        assert!((pos.y + ACTOR_HALF - 96.0).abs() < 0.001);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn wall_contact_reports_only_the_approached_side() {
        let g = boxed_grid();
        let mut pos = cell_center(3, 2);
        let mut vel = Vec2::new(RUN_SPEED, 0.0);

        let mut hit = Contacts::default();
        for _ in 0..60 {
            hit = move_and_collide(&g, &mut pos, &mut vel, ACTOR_HALF, DT);
            if hit.right {
                break;
            }
        }
        assert!(hit.right);
        assert!(!hit.left);
        // Flush against the right wall (col 4, left edge at x=128).
        assert!((pos.x + ACTOR_HALF - 128.0).abs() < 0.001);
        // Horizontal velocity is preserved for the caller to handle.
        assert_eq!(vel.x, RUN_SPEED);
    }

    #[test]
    fn ceiling_contact_zeroes_upward_velocity() {
        let g = boxed_grid();
        let mut pos = cell_center(2, 2);
        let mut vel = Vec2::new(0.0, JUMP_VELOCITY);

        let mut bumped = false;
        for _ in 0..60 {
            let c = move_and_collide(&g, &mut pos, &mut vel, ACTOR_HALF, DT);
            if c.up {
                bumped = true;
                break;
            }
        }
        assert!(bumped);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn bounds_are_walls_except_below() {
        let g = SolidGrid::new(3, 2);
        assert!(g.is_solid(-1, 0));
        assert!(g.is_solid(3, 0));
        assert!(g.is_solid(1, -1));
        assert!(!g.is_solid(1, 2));
    }

    #[test]
    fn overlap_uses_summed_half_extents() {
        let a = Vec2::new(100.0, 100.0);
        assert!(overlaps(a, 14.0, Vec2::new(127.0, 100.0), 14.0));
        assert!(!overlaps(a, 14.0, Vec2::new(128.0, 100.0), 14.0));
        // A larger target reaches further.
        assert!(overlaps(a, 14.0, Vec2::new(129.0, 100.0), 16.0));
    }

    #[test]
    fn rope_range_is_strict() {
        assert!(near_rope(100.0, 119.9));
        assert!(!near_rope(100.0, 120.0));
        assert!(near_rope(100.0, 80.1));
        assert!(!near_rope(100.0, 80.0));
    }
}
