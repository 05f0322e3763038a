//! Multi-button click classification.
//!
//! Mouse input arrives as raw press and release events carrying the set of
//! buttons currently held. A gesture is classified by the widest set held at
//! any point, and fires on the release that lets go of the last button, so
//! "press left, add right, release both" reads as one left+right click no
//! matter the release order.
//!
//! ```
//! use snakesweeper_client::ClickKind;
//! use snakesweeper_client::input::{Buttons, ClickTracker};
//!
//! let mut tracker = ClickTracker::new();
//! tracker.press(Buttons::LEFT);
//! tracker.press(Buttons::LEFT | Buttons::RIGHT);
//! assert_eq!(tracker.release(Buttons::RIGHT), None);
//! let combo = tracker.release(Buttons::NONE).unwrap();
//! assert_eq!(combo.click_kind(), Some(ClickKind::LeftRight));
//! ```

use std::ops::{BitOr, BitOrAssign};

use snakesweeper_common::protocol::ClickKind;

/// Set of held mouse buttons, bit-compatible with the DOM `buttons` mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const LEFT: Buttons = Buttons(1);
    pub const RIGHT: Buttons = Buttons(2);
    pub const MIDDLE: Buttons = Buttons(4);

    /// Masks out anything beyond the three buttons we track.
    pub fn from_bits(bits: u8) -> Buttons {
        Buttons(bits & 0b111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Buttons) {
        self.0 |= rhs.0;
    }
}

/// A completed click gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickCombo {
    Left,
    Right,
    LeftRight,
    Middle,
    LeftMiddle,
    RightMiddle,
    LeftRightMiddle,
}

impl ClickCombo {
    pub fn from_buttons(buttons: Buttons) -> Option<ClickCombo> {
        match buttons.bits() {
            1 => Some(ClickCombo::Left),
            2 => Some(ClickCombo::Right),
            3 => Some(ClickCombo::LeftRight),
            4 => Some(ClickCombo::Middle),
            5 => Some(ClickCombo::LeftMiddle),
            6 => Some(ClickCombo::RightMiddle),
            7 => Some(ClickCombo::LeftRightMiddle),
            _ => None,
        }
    }

    /// The game action this combo maps to. Middle-button combos are
    /// recognized but not bound to an action.
    pub fn click_kind(self) -> Option<ClickKind> {
        match self {
            ClickCombo::Left => Some(ClickKind::Left),
            ClickCombo::Right => Some(ClickKind::Right),
            ClickCombo::LeftRight => Some(ClickKind::LeftRight),
            ClickCombo::Middle
            | ClickCombo::LeftMiddle
            | ClickCombo::RightMiddle
            | ClickCombo::LeftRightMiddle => None,
        }
    }
}

/// Accumulates one press-release gesture. Create one per board; gestures on
/// different boards must not bleed into each other.
#[derive(Debug, Default)]
pub struct ClickTracker {
    max_held: Buttons,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the button set held after a press event.
    pub fn press(&mut self, held: Buttons) {
        self.max_held |= held;
    }

    /// Feed the button set still held after a release event. Returns the
    /// finished combo once every button is up, and `None` while the gesture
    /// is still in flight.
    pub fn release(&mut self, held: Buttons) -> Option<ClickCombo> {
        if !held.is_empty() {
            return None;
        }
        let combo = ClickCombo::from_buttons(self.max_held);
        self.max_held = Buttons::NONE;
        combo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_buttons_classify_directly() {
        let mut tracker = ClickTracker::new();
        tracker.press(Buttons::LEFT);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::Left));

        tracker.press(Buttons::RIGHT);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::Right));

        tracker.press(Buttons::MIDDLE);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::Middle));
    }

    #[test]
    fn chord_gesture_reads_the_same_in_either_release_order() {
        // Left down, right down, left up, right up.
        let mut tracker = ClickTracker::new();
        tracker.press(Buttons::LEFT);
        tracker.press(Buttons::LEFT | Buttons::RIGHT);
        assert_eq!(tracker.release(Buttons::RIGHT), None);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::LeftRight));

        // Same buttons, other order.
        let mut tracker = ClickTracker::new();
        tracker.press(Buttons::RIGHT);
        tracker.press(Buttons::RIGHT | Buttons::LEFT);
        assert_eq!(tracker.release(Buttons::LEFT), None);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::LeftRight));
    }

    #[test]
    fn release_without_a_press_is_silent() {
        let mut tracker = ClickTracker::new();
        assert_eq!(tracker.release(Buttons::NONE), None);
        // And the tracker still works afterwards.
        tracker.press(Buttons::LEFT);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::Left));
    }

    #[test]
    fn gestures_do_not_bleed_into_each_other() {
        let mut tracker = ClickTracker::new();
        tracker.press(Buttons::LEFT | Buttons::RIGHT);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::LeftRight));

        // The next gesture starts from scratch.
        tracker.press(Buttons::LEFT);
        assert_eq!(tracker.release(Buttons::NONE), Some(ClickCombo::Left));
    }

    #[test]
    fn middle_combos_map_to_no_action() {
        assert_eq!(ClickCombo::Middle.click_kind(), None);
        assert_eq!(ClickCombo::LeftRightMiddle.click_kind(), None);
        assert_eq!(ClickCombo::Left.click_kind(), Some(ClickKind::Left));
        assert_eq!(ClickCombo::Right.click_kind(), Some(ClickKind::Right));
        assert_eq!(
            ClickCombo::LeftRight.click_kind(),
            Some(ClickKind::LeftRight)
        );
    }

    #[test]
    fn button_masks_behave_like_the_dom_bitmask() {
        assert_eq!((Buttons::LEFT | Buttons::RIGHT).bits(), 3);
        assert!((Buttons::LEFT | Buttons::MIDDLE).contains(Buttons::MIDDLE));
        assert!(!Buttons::LEFT.contains(Buttons::RIGHT));
        // Extra bits like back/forward buttons are masked away.
        assert_eq!(Buttons::from_bits(0b11111), Buttons::LEFT | Buttons::RIGHT | Buttons::MIDDLE);
        assert_eq!(
            ClickCombo::from_buttons(Buttons::from_bits(0b1000)),
            None
        );
    }
}
