// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::{borrow::Cow, io};

use thiserror::Error;

use crate::Capability;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading from or writing to an open port failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Malformed input, e.g. a missing status byte or a data byte
    /// with the high bit set.
    #[error("malformed MIDI status 0x{status:02X}: {reason}")]
    Protocol { status: u8, reason: &'static str },

    /// Valid MIDI that is not implemented.
    #[error("unsupported: {what}")]
    Unsupported { what: &'static str },

    #[error("MIDI device {device} cannot be opened for {capability}")]
    Capability {
        device: String,
        capability: Capability,
    },

    #[error("MIDI device {device}: {reason}")]
    State {
        device: String,
        reason: &'static str,
    },

    /// The native handle of a port could not be opened or closed.
    #[error("MIDI device {device}: {source}")]
    Transport {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("{reason}: {source}")]
    Discovery {
        reason: Cow<'static, str>,
        #[source]
        source: io::Error,
    },

    #[error("{reason} '{value}'")]
    Config {
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
