// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

//! Conversion between [`Message`]s and the MIDI byte layout.
//!
//! The decoder handles the subset of the protocol that consists of
//! channel voice and channel mode messages. Every message must carry
//! its own status byte, running status is not supported.

use std::{io, ops::Deref};

use crate::{ChannelMode, Command, Error, Message, Result};

const DATA_BYTE_MASK: u8 = 0x7f;

const fn is_data_byte(byte: u8) -> bool {
    byte & !DATA_BYTE_MASK == 0
}

/// Fills the whole buffer, looping on short reads.
///
/// A read of 0 bytes signals the end of the stream.
fn read_exact<R>(read: &mut R, mut buf: &mut [u8]) -> io::Result<()>
where
    R: FnMut(&mut [u8]) -> io::Result<usize> + ?Sized,
{
    while !buf.is_empty() {
        match read(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "end of MIDI stream",
                ));
            }
            Ok(n) => {
                let tmp = buf;
                buf = &mut tmp[n..];
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Decode the next message.
///
/// `read` is invoked repeatedly until the status byte and all data bytes
/// have been received and may block. Bytes that have been consumed before
/// an error occurred are lost, i.e. a failed decode must not be retried
/// in the hope of recovering the same message.
pub fn decode<R>(mut read: R) -> Result<Message>
where
    R: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let mut status = [0u8; 1];
    read_exact(&mut read, &mut status)?;
    let [status] = status;
    let Some(command) = Command::from_status(status) else {
        return Err(Error::Protocol {
            status,
            reason: "unknown command",
        });
    };
    let Some(data_len) = command.data_len() else {
        return Err(Error::Unsupported {
            what: "SysEx/System messages not implemented",
        });
    };
    let mut data = [0u8; 2];
    read_exact(&mut read, &mut data[..data_len])?;
    if !data.iter().copied().all(is_data_byte) {
        return Err(Error::Protocol {
            status,
            reason: "data byte out of range",
        });
    }
    let [data1, data2] = data;
    let message = Message::channel_voice(command, status & 0x0f, data1, data2);
    log::trace!("Decoded MIDI message {message} from 0x{status:02x} {data:02x?}");
    Ok(message)
}

/// Decode the next message from a reader.
pub fn decode_from<R>(reader: &mut R) -> Result<Message>
where
    R: io::Read + ?Sized,
{
    decode(|buf| reader.read(buf))
}

/// An encoded message with up to 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; 3],
    len: usize,
}

impl Frame {
    const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            bytes: [status, data1 & DATA_BYTE_MASK, data2 & DATA_BYTE_MASK],
            len: 3,
        }
    }

    const fn short(status: u8, data1: u8) -> Self {
        Self {
            bytes: [status, data1 & DATA_BYTE_MASK, 0],
            len: 2,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// The channel is 1-based, 0 wraps around to 16.
const fn status_byte(command: Command, channel: u8) -> u8 {
    (command.nibble() << 4) | (channel.wrapping_sub(1) & 0x0f)
}

#[must_use]
pub const fn note_on(channel: u8, note: u8, velocity: u8) -> Frame {
    Frame::new(status_byte(Command::NoteOn, channel), note, velocity)
}

#[must_use]
pub const fn note_off(channel: u8, note: u8, velocity: u8) -> Frame {
    Frame::new(status_byte(Command::NoteOff, channel), note, velocity)
}

#[must_use]
pub const fn key_aftertouch(channel: u8, key: u8, touch: u8) -> Frame {
    Frame::new(status_byte(Command::KeyAftertouch, channel), key, touch)
}

#[must_use]
pub const fn controller_change(channel: u8, controller: u8, value: u8) -> Frame {
    Frame::new(
        status_byte(Command::ControllerChange, channel),
        controller,
        value,
    )
}

#[must_use]
pub const fn program_change(channel: u8, program: u8) -> Frame {
    Frame::short(status_byte(Command::ProgramChange, channel), program)
}

#[must_use]
pub const fn channel_aftertouch(channel: u8, touch: u8) -> Frame {
    Frame::short(status_byte(Command::ChannelAftertouch, channel), touch)
}

/// Pitch bend with a 14-bit `amount`, 8192 is the center position.
///
/// The two most significant bits of `amount` are ignored.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn pitch_bend(channel: u8, amount: u16) -> Frame {
    let lsb = (amount & 0x7f) as u8;
    let msb = ((amount >> 7) & 0x7f) as u8;
    Frame::new(status_byte(Command::PitchBend, channel), lsb, msb)
}

#[must_use]
pub const fn channel_mode(channel: u8, mode: ChannelMode) -> Frame {
    Frame::new(
        status_byte(Command::ControllerChange, channel),
        mode.controller(),
        mode.value(),
    )
}

/// Encode a message with a 0-based channel, the inverse of [`decode`].
///
/// Fails for System messages and for data bytes that are out of range.
pub fn encode(message: &Message) -> Result<Frame> {
    let status = message.status();
    let Some(data_len) = message.command.data_len() else {
        return Err(Error::Unsupported {
            what: "encoding of SysEx/System messages not implemented",
        });
    };
    let data = [message.data1, message.data2];
    if !data[..data_len].iter().copied().all(is_data_byte) {
        return Err(Error::Protocol {
            status,
            reason: "data byte out of range",
        });
    }
    let frame = if data_len == 1 {
        Frame::short(status, message.data1)
    } else {
        Frame::new(status, message.data1, message.data2)
    };
    log::trace!("Encoded MIDI message {message} as {frame:02x?}", frame = frame.as_bytes());
    Ok(frame)
}
