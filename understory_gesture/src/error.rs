// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable gesture errors.
//!
//! These are reported by user callbacks and drag targets. They are logged where
//! the host delivers events and never stop delivery to other recognizers.
//! Protocol violations (resolving twice, tracking a pointer twice, and so on)
//! are not errors; they panic.

use alloc::string::String;

use thiserror::Error;

use crate::recognizer::RecognizerId;

/// Result of a recognizer callback.
pub type GestureResult = Result<(), GestureError>;

/// A failure reported while handling a gesture.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GestureError {
    /// A user callback failed.
    #[error("`{callback}` callback failed: {message}")]
    Callback {
        /// Name of the callback, such as `on_tap`.
        callback: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A drag target failed to apply an update.
    #[error("drag target failed: {0}")]
    DragTarget(String),

    /// The recognizer is not registered with the host (never was, or was disposed).
    #[error("recognizer {0} is not registered")]
    UnknownRecognizer(RecognizerId),
}

impl GestureError {
    /// A callback failure.
    pub fn callback(callback: &'static str, message: impl Into<String>) -> Self {
        Self::Callback {
            callback,
            message: message.into(),
        }
    }
}
