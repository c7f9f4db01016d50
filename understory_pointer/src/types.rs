// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for pointer events: identifiers, device kinds, buttons, and changes.

use core::fmt;
use core::str::FromStr;

/// Identifier of one pointer contact.
///
/// A fresh id is assigned by the sanitizer every time a device goes down, so a
/// `PointerId` names exactly one down → up (or cancel) sequence. Hover events
/// carry the id of the device's most recent contact.
///
/// Ids are allocated from a [`SanitizerContext`](crate::SanitizerContext) and
/// increase monotonically; they are never reused within one context.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PointerId(pub u32);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a physical input device, as reported by the platform.
///
/// Mouse input is folded onto a single virtual device (see
/// [`SanitizerConfig::mouse_device_id`](crate::SanitizerConfig::mouse_device_id));
/// touch and stylus contacts use the platform `pointerId`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DeviceId(pub i64);

/// The kind of device that produced an event.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PointerKind {
    /// A touch-based pointer device.
    Touch,
    /// A mouse-based pointer device.
    Mouse,
    /// A pointer device with a stylus.
    Stylus,
    /// A pointer device with a stylus that has been inverted (eraser end).
    InvertedStylus,
    /// A touchpad reporting pointer motion.
    Trackpad,
    /// An unknown pointer device.
    #[default]
    Unknown,
}

impl PointerKind {
    /// Whether contacts of this kind disappear when they are lifted.
    ///
    /// The sanitizer synthesizes [`PointerChange::Removed`] after the last
    /// up or cancel of such a device.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Touch)
    }

    /// Whether this kind reports positions with sub-pixel precision (mouse-like).
    pub const fn is_precise(self) -> bool {
        matches!(self, Self::Mouse)
    }
}

impl FromStr for PointerKind {
    type Err = core::convert::Infallible;

    /// Parse a DOM `pointerType` string. Unrecognized names map to [`PointerKind::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mouse" => Self::Mouse,
            "touch" => Self::Touch,
            "pen" => Self::Stylus,
            _ => Self::Unknown,
        })
    }
}

bitflags::bitflags! {
    /// A set of [`PointerKind`]s, used to restrict which devices a consumer accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DeviceKinds: u8 {
        /// [`PointerKind::Touch`].
        const TOUCH           = 0b0000_0001;
        /// [`PointerKind::Mouse`].
        const MOUSE           = 0b0000_0010;
        /// [`PointerKind::Stylus`].
        const STYLUS          = 0b0000_0100;
        /// [`PointerKind::InvertedStylus`].
        const INVERTED_STYLUS = 0b0000_1000;
        /// [`PointerKind::Trackpad`].
        const TRACKPAD        = 0b0001_0000;
        /// [`PointerKind::Unknown`].
        const UNKNOWN         = 0b0010_0000;
    }
}

impl From<PointerKind> for DeviceKinds {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Touch => Self::TOUCH,
            PointerKind::Mouse => Self::MOUSE,
            PointerKind::Stylus => Self::STYLUS,
            PointerKind::InvertedStylus => Self::INVERTED_STYLUS,
            PointerKind::Trackpad => Self::TRACKPAD,
            PointerKind::Unknown => Self::UNKNOWN,
        }
    }
}

impl DeviceKinds {
    /// Whether `kind` is a member of this set.
    pub fn allows(self, kind: PointerKind) -> bool {
        self.contains(kind.into())
    }
}

bitflags::bitflags! {
    /// Pressed buttons, laid out like the DOM `buttons` bitmask.
    ///
    /// For touch and stylus contacts the contact itself is reported as [`Buttons::PRIMARY`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u32 {
        /// Primary button (left mouse button, touch contact, stylus tip).
        const PRIMARY   = 0b0000_0001;
        /// Secondary button (right mouse button, stylus barrel button).
        const SECONDARY = 0b0000_0010;
        /// Tertiary button (middle mouse button / wheel press).
        const TERTIARY  = 0b0000_0100;
        /// Back button.
        const BACK      = 0b0000_1000;
        /// Forward button.
        const FORWARD   = 0b0001_0000;
    }
}

impl Buttons {
    /// Convert a DOM `button` index (the button whose state changed) into a mask.
    ///
    /// Returns an empty mask for `-1` ("no button changed") and unknown indices.
    pub fn from_dom_button(button: i16) -> Self {
        match button {
            0 => Self::PRIMARY,
            1 => Self::TERTIARY,
            2 => Self::SECONDARY,
            3 => Self::BACK,
            4 => Self::FORWARD,
            _ => Self::empty(),
        }
    }

    /// Convert a DOM `buttons` bitmask, dropping bits outside the known set.
    pub fn from_dom_buttons(buttons: u32) -> Self {
        Self::from_bits_truncate(buttons)
    }
}

/// The transition a canonical pointer event describes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerChange {
    /// The input from the pointer is no longer directed towards this receiver.
    Cancel,
    /// The device has started tracking the pointer.
    Added,
    /// The device is no longer tracking the pointer.
    Removed,
    /// The pointer has moved with no buttons pressed.
    Hover,
    /// The pointer made contact with the device (a button went from none to some).
    Down,
    /// The pointer has moved while in contact with the device.
    Move,
    /// The pointer stopped making contact with the device.
    Up,
}

impl PointerChange {
    /// Whether the pointer is in contact after this change.
    pub const fn leaves_down(self) -> bool {
        matches!(self, Self::Down | Self::Move)
    }

    /// Whether this change ends a contact sequence.
    pub const fn ends_contact(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}
