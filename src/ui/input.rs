/// Keyboard state for the frame loop.
///
/// Most terminals only deliver Press/Repeat key events, so "held" is
/// inferred: a key stays held until its most recent press is older than
/// HOLD_TIMEOUT (key repeat refreshes the deadline well within that).
/// Terminals that do send Release events simply end the hold early.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// How long a press keeps its key held when no repeat follows.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct Keyboard {
    /// Deadline past which each key no longer counts as held.
    held_until: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the current frame.
    fresh: Vec<KeyCode>,
    ctrl_c: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            held_until: HashMap::new(),
            fresh: Vec::new(),
            ctrl_c: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the
    /// simulation tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while event::poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key.code, key.kind, key.modifiers, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    /// Is any of these keys currently held? (continuous actions: run, climb)
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.held_until.contains_key(c))
    }

    /// Did any of these keys go down this frame? (one-shot actions:
    /// confirm, restart, quit)
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    // ── Internal ──

    fn begin_frame(&mut self) {
        self.fresh.clear();
        self.ctrl_c = false;
    }

    fn apply(&mut self, code: KeyCode, kind: KeyEventKind, mods: KeyModifiers, now: Instant) {
        if kind == KeyEventKind::Release {
            self.held_until.remove(&code);
            return;
        }
        if mods.contains(KeyModifiers::CONTROL)
            && matches!(code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }
        if self.held_until.insert(code, now + HOLD_TIMEOUT).is_none() {
            self.fresh.push(code);
        }
    }

    fn expire(&mut self, now: Instant) {
        self.held_until.retain(|_, deadline| *deadline > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: KeyCode = KeyCode::Char('a');

    fn press(kb: &mut Keyboard, code: KeyCode, at: Instant) {
        kb.apply(code, KeyEventKind::Press, KeyModifiers::NONE, at);
    }

    #[test]
    fn press_is_fresh_then_held() {
        let mut kb = Keyboard::new();
        let t0 = Instant::now();

        kb.begin_frame();
        press(&mut kb, A, t0);
        kb.expire(t0);
        assert!(kb.any_pressed(&[A]));
        assert!(kb.any_held(&[A]));

        // Next frame a repeat keeps the key held but it is no longer fresh.
        kb.begin_frame();
        kb.apply(A, KeyEventKind::Repeat, KeyModifiers::NONE, t0 + Duration::from_millis(50));
        kb.expire(t0 + Duration::from_millis(50));
        assert!(!kb.any_pressed(&[A]));
        assert!(kb.any_held(&[A]));
    }

    #[test]
    fn hold_lapses_without_repeats() {
        let mut kb = Keyboard::new();
        let t0 = Instant::now();

        kb.begin_frame();
        press(&mut kb, A, t0);
        kb.expire(t0 + HOLD_TIMEOUT + Duration::from_millis(1));
        assert!(!kb.any_held(&[A]));

        // Pressing again after the lapse counts as a fresh press.
        kb.begin_frame();
        press(&mut kb, A, t0 + HOLD_TIMEOUT + Duration::from_millis(10));
        assert!(kb.any_pressed(&[A]));
    }

    #[test]
    fn release_event_ends_the_hold_early() {
        let mut kb = Keyboard::new();
        let t0 = Instant::now();

        kb.begin_frame();
        press(&mut kb, A, t0);
        kb.apply(A, KeyEventKind::Release, KeyModifiers::NONE, t0);
        assert!(!kb.any_held(&[A]));
    }

    #[test]
    fn ctrl_c_is_flagged_per_frame() {
        let mut kb = Keyboard::new();

        kb.begin_frame();
        kb.apply(KeyCode::Char('c'), KeyEventKind::Press, KeyModifiers::CONTROL, Instant::now());
        assert!(kb.ctrl_c_pressed());

        kb.begin_frame();
        assert!(!kb.ctrl_c_pressed());
    }
}
