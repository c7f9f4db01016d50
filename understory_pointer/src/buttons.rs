// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-device button tracking.
//!
//! Platforms occasionally drop or reorder button transitions: a right click that
//! opens a context menu never delivers its `pointerup`, a fast move after a press
//! can report buttons before the `pointerdown`, and a second button pressed while
//! the first is held arrives as another `pointerdown`. [`ButtonSanitizer`] keeps
//! the pressed mask for one device and classifies each raw event into the change
//! the canonical stream should carry.

use crate::types::{Buttons, PointerChange};

/// The canonical change and button mask derived from one raw event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonTransition {
    /// Change to emit.
    pub change: PointerChange,
    /// Buttons pressed after the change.
    pub buttons: Buttons,
}

impl ButtonTransition {
    const fn new(change: PointerChange, buttons: Buttons) -> Self {
        Self { change, buttons }
    }
}

/// Tracks the pressed buttons of a single device.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ButtonSanitizer {
    pressed: Buttons,
}

impl ButtonSanitizer {
    /// Create a tracker with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buttons currently considered pressed.
    pub fn pressed(&self) -> Buttons {
        self.pressed
    }

    /// Classify a `pointerdown`.
    ///
    /// The first press yields [`PointerChange::Down`]. A press while other
    /// buttons are held only updates the mask and yields [`PointerChange::Move`].
    pub fn sanitize_down(&mut self, button: i16, buttons: Buttons) -> ButtonTransition {
        if !self.pressed.is_empty() {
            return self.sanitize_move(buttons);
        }
        // Some platforms report `buttons == 0` on a down; fall back to the changed button.
        self.pressed = if buttons.is_empty() {
            Buttons::from_dom_button(button)
        } else {
            buttons
        };
        if self.pressed.is_empty() {
            self.pressed = Buttons::PRIMARY;
        }
        ButtonTransition::new(PointerChange::Down, self.pressed)
    }

    /// Classify a `pointermove`.
    pub fn sanitize_move(&mut self, buttons: Buttons) -> ButtonTransition {
        // Buttons reported on a move before any down was seen (e.g. a quick move
        // right after a secondary press) must not start a contact.
        if self.pressed.is_empty() && !buttons.is_empty() {
            return ButtonTransition::new(PointerChange::Hover, self.pressed);
        }
        self.pressed = buttons;
        let change = if self.pressed.is_empty() {
            PointerChange::Hover
        } else {
            PointerChange::Move
        };
        ButtonTransition::new(change, self.pressed)
    }

    /// Detect an up the platform never delivered.
    ///
    /// Returns an [`PointerChange::Up`] when buttons were pressed but the
    /// incoming event reports none.
    pub fn sanitize_missing_up(&mut self, buttons: Buttons) -> Option<ButtonTransition> {
        if !self.pressed.is_empty() && buttons.is_empty() {
            self.pressed = Buttons::empty();
            return Some(ButtonTransition::new(PointerChange::Up, self.pressed));
        }
        None
    }

    /// Classify a `pointerup`.
    ///
    /// Returns `None` for an up with nothing pressed (a duplicate or an up whose
    /// release was already synthesized). Releasing only some buttons yields a
    /// [`PointerChange::Move`] with the remaining mask.
    pub fn sanitize_up(&mut self, buttons: Buttons) -> Option<ButtonTransition> {
        if self.pressed.is_empty() {
            return None;
        }
        self.pressed = buttons;
        let change = if self.pressed.is_empty() {
            PointerChange::Up
        } else {
            PointerChange::Move
        };
        Some(ButtonTransition::new(change, self.pressed))
    }

    /// Classify a `pointercancel`; all buttons are released.
    pub fn sanitize_cancel(&mut self) -> ButtonTransition {
        self.pressed = Buttons::empty();
        ButtonTransition::new(PointerChange::Cancel, self.pressed)
    }
}
