// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use strum::{EnumIter, FromRepr, IntoStaticStr};

/// Message class, i.e. the high nibble of the status byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum Command {
    #[default]
    NoteOff = 0x8,
    NoteOn = 0x9,
    /// Polyphonic key pressure
    KeyAftertouch = 0xa,
    ControllerChange = 0xb,
    ProgramChange = 0xc,
    /// Channel pressure
    ChannelAftertouch = 0xd,
    PitchBend = 0xe,
    /// System Exclusive, System Common, and System Realtime
    System = 0xf,
}

impl Command {
    /// Extracts the command from a status byte.
    ///
    /// Returns `None` for data bytes, i.e. if the high bit is not set.
    #[must_use]
    pub fn from_status(status: u8) -> Option<Self> {
        Self::from_repr((status >> 4) & 0x0f)
    }

    #[must_use]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Number of data bytes following the status byte.
    ///
    /// `None` for [`Command::System`] messages whose length depends
    /// on the status byte and the payload.
    #[must_use]
    pub const fn data_len(self) -> Option<usize> {
        match self {
            Self::NoteOff
            | Self::NoteOn
            | Self::KeyAftertouch
            | Self::ControllerChange
            | Self::PitchBend => Some(2),
            Self::ProgramChange | Self::ChannelAftertouch => Some(1),
            Self::System => None,
        }
    }

    #[must_use]
    pub const fn is_channel_message(self) -> bool {
        !matches!(self, Self::System)
    }
}

/// A single MIDI event.
///
/// The `channel` is 0-based as transmitted on the wire, i.e. in the range
/// 0..=15. Note that the typed send operations of [`crate::Device`] expect
/// a 1-based channel instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub command: Command,
    pub channel: u8,
    pub data1: u8,
    /// Unused by [`Command::ProgramChange`] and [`Command::ChannelAftertouch`].
    pub data2: u8,
    /// Reserved for System Exclusive payloads, currently never populated.
    pub sysex: Vec<u8>,
}

impl Message {
    #[must_use]
    pub const fn channel_voice(command: Command, channel: u8, data1: u8, data2: u8) -> Self {
        Self {
            command,
            channel,
            data1,
            data2,
            sysex: Vec::new(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> u8 {
        (self.command.nibble() << 4) | (self.channel & 0x0f)
    }

    /// The 14-bit value of a [`Command::PitchBend`] message.
    #[must_use]
    pub fn pitch_bend_amount(&self) -> u16 {
        (u16::from(self.data2 & 0x7f) << 7) | u16::from(self.data1 & 0x7f)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            command,
            channel,
            data1,
            data2,
            sysex: _,
        } = self;
        write!(
            f,
            "{{0x{command:X} ch:{channel} {data1} {data2}}}",
            command = command.nibble()
        )
    }
}

/// Channel Mode messages, sent as reserved controller numbers 120..=127.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum ChannelMode {
    AllSoundOff,
    ResetAllControllers,
    LocalControl(bool),
    AllNotesOff,
    OmniOff,
    OmniOn,
    /// Mono mode with the given number of channels, 0 selects all
    /// available voices.
    MonoOn {
        channels: u8,
    },
    PolyOn,
}

impl ChannelMode {
    #[must_use]
    pub const fn controller(self) -> u8 {
        match self {
            Self::AllSoundOff => 120,
            Self::ResetAllControllers => 121,
            Self::LocalControl(_) => 122,
            Self::AllNotesOff => 123,
            Self::OmniOff => 124,
            Self::OmniOn => 125,
            Self::MonoOn { .. } => 126,
            Self::PolyOn => 127,
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::LocalControl(true) => 127,
            Self::MonoOn { channels } => channels & 0x7f,
            _ => 0,
        }
    }
}
