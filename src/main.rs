/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::{EnemyKind, FrameInput};
use sim::event::GameEvent;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::Keyboard;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    let config = GameConfig::load();

    let rooms = sim::level::load_rooms(&config);
    let mut world = WorldState::new(rooms);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pharaoh's Curse!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = Keyboard::new();
    let mut rng = rand::thread_rng();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    // The simulation integrates in real seconds per tick.
    let dt = config.tick_rate_ms as f32 / 1000.0;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb)? {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.phase == Phase::Playing {
                let input = detect_input(&kb);
                let events = step::step(world, input, dt, &mut rng)?;
                process_events(world, &events);
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_input(kb: &Keyboard) -> FrameInput {
    FrameInput {
        left: kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT),
        right: kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT),
        up: kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP),
        down: kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN),
        jump: kb.any_held(KEYS_JUMP) || kb.any_pressed(KEYS_JUMP),
    }
}

/// Phase-dependent meta keys (menus, restart, quit).
/// Returns true when the game should exit.
fn handle_meta(world: &mut WorldState, kb: &Keyboard) -> Result<bool, sim::level::RoomError> {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    match world.phase {
        Phase::Title => {
            if confirm {
                step::restart(world)?;
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return Ok(true);
            }
        }
        Phase::Playing => {
            if esc {
                world.phase = Phase::Title;
                world.message.clear();
                world.message_timer = 0;
            } else if kb.any_pressed(KEYS_RESTART) {
                step::restart(world)?;
                world.set_message("Back to the first chamber", 120);
            }
        }
        Phase::GameOver => {
            if confirm || kb.any_pressed(KEYS_RESTART) {
                step::restart(world)?;
            } else if esc || kb.any_pressed(KEYS_QUIT) {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

/// Turn simulation events into HUD messages. Later events in the batch
/// overwrite earlier ones, except the room banner which never displaces
/// a message about why the room changed.
fn process_events(world: &mut WorldState, events: &[GameEvent]) {
    // Tracks whether anything in THIS batch already set a message. A stale
    // banner from an earlier tick must not suppress the room name.
    let mut explained = false;
    for event in events {
        match event {
            GameEvent::KeyCollected => {
                world.set_message("The ankh key! Now for the door", 150);
                explained = true;
            }
            GameEvent::TreasureCollected { total } => {
                world.set_message(&format!("Treasure plundered ({total})"), 120);
                explained = true;
            }
            GameEvent::ExtraLife { lives } => {
                world.set_message(&format!("The gods smile: extra life! ♥×{lives}"), 150);
                explained = true;
            }
            GameEvent::EnemyContact { kind: EnemyKind::WingedAvatar } => {
                world.set_message("The winged avatar snatches the key!", 180);
                explained = true;
            }
            GameEvent::Teleported { .. } => {
                world.set_message("...and hurls you through the tomb!", 180);
                explained = true;
            }
            GameEvent::TrapSprung => {
                world.set_message("A hidden trap springs!", 150);
                explained = true;
            }
            GameEvent::PlayerFell => {
                world.set_message("Swallowed by the depths!", 150);
                explained = true;
            }
            GameEvent::LifeLost { remaining } => {
                if *remaining > 0 {
                    world.set_message(&format!("The curse strikes! ♥×{remaining}"), 150);
                    explained = true;
                }
            }
            GameEvent::GameOver => {
                world.set_message("THE CURSE CLAIMS YOU", 120);
                explained = true;
            }
            GameEvent::RoomEntered { room } => {
                // Only when nothing else in this batch explains the change.
                if !explained {
                    let name = world
                        .rooms
                        .get(room.wrapping_sub(1))
                        .map(|r| r.name.clone())
                        .unwrap_or_default();
                    world.set_message(&format!("Room {room}: {name}"), 150);
                }
            }
            GameEvent::DoorOpened { .. } | GameEvent::EnemyContact { .. } => {}
        }
    }
}
