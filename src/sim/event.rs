/// Events emitted during a simulation step.
/// The presentation layer consumes these for HUD and message updates.

use crate::domain::entity::EnemyKind;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GameEvent {
    KeyCollected,
    DoorOpened { room: usize },
    TreasureCollected { total: u32 },
    ExtraLife { lives: u32 },
    EnemyContact { kind: EnemyKind },
    TrapSprung,
    Teleported { room: usize },
    RoomEntered { room: usize },
    PlayerFell,
    LifeLost { remaining: u32 },
    GameOver,
}
