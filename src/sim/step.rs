/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Horizontal run input (velocity + run-up timer)
///   2. Rope state (purely horizontal proximity)
///   3. Jump gating (run-up, grounded, off rope)
///   4. Player motion (gravity + grid collision, or free climb on rope)
///   5. Enemy patrol (gravity for ground enemies, wall bounce)
///   6. Overlap triggers (key, door, treasure, enemy, trap)
///   7. World-fall check
///
/// Any trigger that reloads the room (door, teleport, respawn) is an
/// immediate cutover: overlap processing stops and the tick ends, so no
/// later logic sees stale entities.
///
/// All session mutation happens through the transition functions in this
/// module; physics and presentation only read it.

use rand::Rng;

use crate::domain::entity::{EnemyKind, EntityKind, FrameInput};
use crate::domain::physics::{
    self, ACTOR_HALF, FALL_MARGIN, GRAVITY, JUMP_VELOCITY, RUN_BEFORE_JUMP_MS,
};
use crate::sim::event::GameEvent;
use crate::sim::level::{self, RoomError};
use crate::sim::world::{Phase, Session, WorldState, TREASURES_PER_LIFE};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(
    world: &mut WorldState,
    input: FrameInput,
    dt: f32,
    rng: &mut impl Rng,
) -> Result<Vec<GameEvent>, RoomError> {
    if world.phase != Phase::Playing {
        return Ok(vec![]);
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.tick_message();

    resolve_run_input(world, input, dt);
    resolve_rope_state(world);
    resolve_jump(world, input);
    resolve_player_motion(world, input, dt);
    resolve_enemy_patrol(world, dt);
    if resolve_overlaps(world, &mut events, rng)? {
        return Ok(events);
    }
    resolve_world_fall(world, &mut events)?;

    Ok(events)
}

/// Full session reset: room 1, starting lives, no key, no treasure.
pub fn restart(world: &mut WorldState) -> Result<(), RoomError> {
    world.session = Session::new();
    world.phase = Phase::Playing;
    level::load_room(world, 1)
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Held left/right sets the run velocity directly and accumulates the
/// run-up timer; releasing both zeroes velocity and resets the timer.
fn resolve_run_input(world: &mut WorldState, input: FrameInput, dt: f32) {
    world.player.vel.x = physics::run_velocity(input);
    if input.left || input.right {
        world.player.run_time_ms += dt * 1000.0;
    } else {
        world.player.run_time_ms = 0.0;
    }
}

fn resolve_rope_state(world: &mut WorldState) {
    let px = world.player.pos.x;
    world.player.on_rope = world
        .entities
        .iter()
        .any(|e| e.kind == EntityKind::Rope && physics::near_rope(px, e.pos.x));
}

/// Running-before-jumping rule: the jump is honored only after more than
/// 300ms of continuous running, while grounded and off any rope.
fn resolve_jump(world: &mut WorldState, input: FrameInput) {
    if input.jump
        && world.player.grounded
        && !world.player.on_rope
        && world.player.run_time_ms > RUN_BEFORE_JUMP_MS
    {
        world.player.vel.y = JUMP_VELOCITY;
    }
}

fn resolve_player_motion(world: &mut WorldState, input: FrameInput, dt: f32) {
    if world.player.on_rope {
        // Climbing: gravity off, vertical velocity driven directly, and
        // platform collision suppressed so gaps can be passed through.
        world.player.vel.y = physics::climb_velocity(input);
        let vel = world.player.vel;
        physics::move_free(&mut world.player.pos, vel, ACTOR_HALF, world.level_w, dt);
        world.player.grounded = false;
    } else {
        world.player.vel.y += GRAVITY * dt;
        let contacts = physics::move_and_collide(
            &world.solid,
            &mut world.player.pos,
            &mut world.player.vel,
            ACTOR_HALF,
            dt,
        );
        world.player.grounded = contacts.down;
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy patrol
// ══════════════════════════════════════════════════════════════

/// Constant-velocity patrol: a wall contact negates the horizontal
/// velocity, once per contact (collision reports only the approached
/// side, so there is no simultaneous-sides case). Ground enemies fall;
/// the winged avatar patrols without ground contact.
fn resolve_enemy_patrol(world: &mut WorldState, dt: f32) {
    let solid = &world.solid;
    for e in world.entities.iter_mut() {
        let EntityKind::Enemy(kind) = e.kind else { continue };
        if kind.gravity_affected() {
            e.vel.y += GRAVITY * dt;
        }
        let contacts = physics::move_and_collide(solid, &mut e.pos, &mut e.vel, ACTOR_HALF, dt);
        if contacts.left || contacts.right {
            e.vel.x = -e.vel.x;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Overlap triggers
// ══════════════════════════════════════════════════════════════

/// Non-blocking contact checks after movement resolution, dispatched on
/// entity kind. Returns true if a trigger reloaded the room (or ended the
/// game) — the caller must treat that as a cutover.
fn resolve_overlaps(
    world: &mut WorldState,
    events: &mut Vec<GameEvent>,
    rng: &mut impl Rng,
) -> Result<bool, RoomError> {
    let p = world.player.pos;
    let hits: Vec<usize> = world
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| physics::overlaps(p, ACTOR_HALF, e.pos, e.kind.half_extent()))
        .map(|(i, _)| i)
        .collect();

    let mut removed: Vec<usize> = vec![];
    for idx in hits {
        match world.entities[idx].kind {
            EntityKind::Key => collect_key(world, idx, &mut removed, events),
            EntityKind::Treasure => collect_treasure(world, idx, &mut removed, events),
            EntityKind::Door { next_room } => {
                if try_open_door(world, next_room, events)? {
                    return Ok(true);
                }
            }
            EntityKind::Enemy(kind) => {
                hit_enemy(world, kind, events, rng)?;
                return Ok(true);
            }
            EntityKind::Trap => {
                events.push(GameEvent::TrapSprung);
                lose_life(world, events)?;
                return Ok(true);
            }
            EntityKind::Rope => {}
        }
    }

    for idx in removed.into_iter().rev() {
        world.entities.remove(idx);
    }
    Ok(false)
}

// ══════════════════════════════════════════════════════════════
// State-machine transitions (sole writers of Session)
// ══════════════════════════════════════════════════════════════

fn collect_key(world: &mut WorldState, idx: usize, removed: &mut Vec<usize>, events: &mut Vec<GameEvent>) {
    world.session.has_key = true;
    removed.push(idx);
    events.push(GameEvent::KeyCollected);
}

fn collect_treasure(world: &mut WorldState, idx: usize, removed: &mut Vec<usize>, events: &mut Vec<GameEvent>) {
    removed.push(idx);
    world.session.treasures_collected += 1;
    events.push(GameEvent::TreasureCollected {
        total: world.session.treasures_collected,
    });
    if world.session.treasures_collected % TREASURES_PER_LIFE == 0 {
        world.session.lives += 1;
        events.push(GameEvent::ExtraLife { lives: world.session.lives });
    }
}

/// The door only opens with the key; without it the overlap is inert.
/// Returns true when the room changed.
fn try_open_door(
    world: &mut WorldState,
    next_room: usize,
    events: &mut Vec<GameEvent>,
) -> Result<bool, RoomError> {
    if !world.session.has_key {
        return Ok(false);
    }
    events.push(GameEvent::DoorOpened { room: next_room });
    change_room(world, next_room, events)?;
    Ok(true)
}

fn hit_enemy(
    world: &mut WorldState,
    kind: EnemyKind,
    events: &mut Vec<GameEvent>,
    rng: &mut impl Rng,
) -> Result<(), RoomError> {
    events.push(GameEvent::EnemyContact { kind });
    if kind == EnemyKind::WingedAvatar {
        // The avatar scatters rather than kills: the key is revoked and
        // the player lands in a uniformly random room (possibly this one).
        world.session.has_key = false;
        let room = rng.gen_range(1..=world.rooms.len());
        events.push(GameEvent::Teleported { room });
        change_room(world, room, events)
    } else {
        lose_life(world, events)
    }
}

/// Synchronous teardown-and-rebuild; lives, key, and the treasure tally
/// ride across untouched.
fn change_room(
    world: &mut WorldState,
    room: usize,
    events: &mut Vec<GameEvent>,
) -> Result<(), RoomError> {
    level::load_room(world, room)?;
    events.push(GameEvent::RoomEntered { room });
    Ok(())
}

fn lose_life(world: &mut WorldState, events: &mut Vec<GameEvent>) -> Result<(), RoomError> {
    world.session.lives = world.session.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost { remaining: world.session.lives });
    if world.session.lives == 0 {
        world.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
        Ok(())
    } else {
        let room = world.session.current_room;
        change_room(world, room, events)
    }
}

// ══════════════════════════════════════════════════════════════
// World-fall check
// ══════════════════════════════════════════════════════════════

fn resolve_world_fall(world: &mut WorldState, events: &mut Vec<GameEvent>) -> Result<(), RoomError> {
    if world.player.pos.y > world.level_h + FALL_MARGIN {
        events.push(GameEvent::PlayerFell);
        lose_life(world, events)?;
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
