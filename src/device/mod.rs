// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    borrow::Cow,
    io::{self, Write as _},
};

use derive_more::Display;
use strum::IntoStaticStr;

use crate::{codec, ChannelMode, Error, Message, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
    Input,
    Output,
}

/// Identifies a port as found by backend discovery.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{label} ({address})")]
pub struct PortDescriptor {
    /// Friendly name, e.g. "UM-ONE MIDI 1"
    pub label: Cow<'static, str>,

    /// Transport-specific address, e.g. "hw:1,0,0"
    pub address: String,

    pub is_input: bool,

    pub is_output: bool,
}

/// Native byte streams of a transport backend.
///
/// Reads on an input are expected to block until at least one byte
/// is available. Writes on an output may accept only a part of the
/// bytes or fail with [`io::ErrorKind::WouldBlock`].
pub trait Transport: Send {
    type Input: io::Read + Send;
    type Output: io::Write + Send;

    fn open_input(&self, address: &str) -> io::Result<Self::Input>;

    fn open_output(&self, address: &str) -> io::Result<Self::Output>;

    /// Release the native input handle.
    ///
    /// The handle is dropped after this function returned successfully.
    /// On failure it is kept and the input remains open.
    fn close_input(&self, _input: &mut Self::Input) -> io::Result<()> {
        Ok(())
    }

    /// Release the native output handle.
    ///
    /// Same semantics as [`Transport::close_input`].
    fn close_output(&self, output: &mut Self::Output) -> io::Result<()> {
        output.flush()
    }
}

/// A MIDI port with independently opened input and output.
///
/// The channel voice send operations are fire-and-forget. Frames are
/// silently dropped if the output is not open and write errors are
/// only logged.
///
/// The channel of all send operations is 1-based, i.e. in the range 1..=16.
pub trait Device: Send {
    fn descriptor(&self) -> &PortDescriptor;

    /// Display name, combining label and address.
    fn name(&self) -> String {
        self.descriptor().to_string()
    }

    fn is_input(&self) -> bool {
        self.descriptor().is_input
    }

    fn is_output(&self) -> bool {
        self.descriptor().is_output
    }

    fn is_input_open(&self) -> bool;

    fn is_output_open(&self) -> bool;

    fn open_input(&mut self) -> Result<()>;

    fn open_output(&mut self) -> Result<()>;

    /// Close both input and output.
    ///
    /// Closing is attempted for both sides even if closing the first
    /// side fails. Sides that are not open are ignored.
    fn close(&mut self) -> Result<()>;

    /// Write an encoded frame if the output is open.
    fn send_best_effort(&mut self, frame: &[u8]);

    /// Encode and write a message with a 0-based channel.
    ///
    /// Unlike the typed send operations all failures are reported.
    fn send(&mut self, message: &Message) -> Result<()>;

    /// Block until the next message has been received.
    ///
    /// `message` is only modified on success.
    fn receive(&mut self, message: &mut Message) -> Result<()>;

    // Channel Voice messages

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send_best_effort(&codec::note_on(channel, note, velocity));
    }

    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send_best_effort(&codec::note_off(channel, note, velocity));
    }

    fn key_aftertouch(&mut self, channel: u8, key: u8, touch: u8) {
        self.send_best_effort(&codec::key_aftertouch(channel, key, touch));
    }

    fn controller_change(&mut self, channel: u8, controller: u8, value: u8) {
        self.send_best_effort(&codec::controller_change(channel, controller, value));
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.send_best_effort(&codec::program_change(channel, program));
    }

    fn channel_aftertouch(&mut self, channel: u8, touch: u8) {
        self.send_best_effort(&codec::channel_aftertouch(channel, touch));
    }

    fn pitch_bend(&mut self, channel: u8, amount: u16) {
        self.send_best_effort(&codec::pitch_bend(channel, amount));
    }

    // Channel Mode messages

    fn channel_mode(&mut self, channel: u8, mode: ChannelMode) {
        self.send_best_effort(&codec::channel_mode(channel, mode));
    }
}

/// [`Device`] backed by the byte streams of a [`Transport`].
#[allow(missing_debug_implementations)]
pub struct RawMidiDevice<T>
where
    T: Transport,
{
    descriptor: PortDescriptor,
    transport: T,
    input: Option<T::Input>,
    output: Option<T::Output>,
    // Unwritten tail of the last frame
    pending_output: Vec<u8>,
}

impl<T> RawMidiDevice<T>
where
    T: Transport,
{
    #[must_use]
    pub const fn new(descriptor: PortDescriptor, transport: T) -> Self {
        Self {
            descriptor,
            transport,
            input: None,
            output: None,
            pending_output: Vec::new(),
        }
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn transport_error(&self, source: io::Error) -> Error {
        Error::Transport {
            device: self.name(),
            source,
        }
    }

    fn close_input(&mut self) -> Result<()> {
        let Some(input) = &mut self.input else {
            return Ok(());
        };
        self.transport
            .close_input(input)
            .map_err(|err| self.transport_error(err))?;
        self.input = None;
        log::debug!("Closed MIDI input {name}", name = self.descriptor);
        Ok(())
    }

    fn close_output(&mut self) -> Result<()> {
        let Some(output) = &mut self.output else {
            return Ok(());
        };
        if let Err(err) = write_pending(output, &mut self.pending_output) {
            log::warn!(
                "Failed to complete MIDI output {pending:02x?} for {name}: {err}",
                pending = self.pending_output,
                name = self.descriptor
            );
        }
        self.transport
            .close_output(output)
            .map_err(|err| self.transport_error(err))?;
        self.output = None;
        self.pending_output.clear();
        log::debug!("Closed MIDI output {name}", name = self.descriptor);
        Ok(())
    }
}

impl<T> Device for RawMidiDevice<T>
where
    T: Transport,
{
    fn descriptor(&self) -> &PortDescriptor {
        &self.descriptor
    }

    fn is_input_open(&self) -> bool {
        self.input.is_some()
    }

    fn is_output_open(&self) -> bool {
        self.output.is_some()
    }

    fn open_input(&mut self) -> Result<()> {
        if !self.is_input() {
            return Err(Error::Capability {
                device: self.name(),
                capability: Capability::Input,
            });
        }
        if self.is_input_open() {
            log::debug!("MIDI input {name} is already open", name = self.descriptor);
            return Ok(());
        }
        let input = self
            .transport
            .open_input(&self.descriptor.address)
            .map_err(|err| self.transport_error(err))?;
        self.input = Some(input);
        log::debug!("Opened MIDI input {name}", name = self.descriptor);
        Ok(())
    }

    fn open_output(&mut self) -> Result<()> {
        if !self.is_output() {
            return Err(Error::Capability {
                device: self.name(),
                capability: Capability::Output,
            });
        }
        if self.is_output_open() {
            log::debug!("MIDI output {name} is already open", name = self.descriptor);
            return Ok(());
        }
        let output = self
            .transport
            .open_output(&self.descriptor.address)
            .map_err(|err| self.transport_error(err))?;
        self.output = Some(output);
        log::debug!("Opened MIDI output {name}", name = self.descriptor);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let input_result = self.close_input();
        let output_result = self.close_output();
        input_result.and(output_result)
    }

    fn send_best_effort(&mut self, frame: &[u8]) {
        let Some(output) = &mut self.output else {
            log::trace!(
                "Discarding MIDI output {frame:02x?} for {name}: not open",
                name = self.descriptor
            );
            return;
        };
        log::trace!("Sending MIDI output {frame:02x?}");
        if let Err(err) = write_frame(output, &mut self.pending_output, frame) {
            log::warn!(
                "Dropped MIDI output {frame:02x?} for {name}: {err}",
                name = self.descriptor
            );
        }
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        let frame = codec::encode(message)?;
        let Some(output) = &mut self.output else {
            return Err(Error::State {
                device: self.name(),
                reason: "not open for output",
            });
        };
        write_frame(output, &mut self.pending_output, &frame)?;
        Ok(())
    }

    fn receive(&mut self, message: &mut Message) -> Result<()> {
        let Some(input) = &mut self.input else {
            return Err(Error::State {
                device: self.name(),
                reason: "not open for input",
            });
        };
        *message = codec::decode_from(input)?;
        Ok(())
    }
}

/// Write as many bytes as accepted and return their number.
///
/// Only fails if not a single byte has been written.
fn write_partial<W>(output: &mut W, bytes: &[u8]) -> io::Result<usize>
where
    W: io::Write + ?Sized,
{
    let mut written = 0;
    while written < bytes.len() {
        match output.write(&bytes[written..]) {
            Ok(0) => break,
            Ok(count) => written += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => (),
            Err(err) if written == 0 => return Err(err),
            Err(err) => {
                log::debug!("MIDI output stalled after {written} byte(s): {err}");
                break;
            }
        }
    }
    if written == 0 && !bytes.is_empty() {
        return Err(io::ErrorKind::WriteZero.into());
    }
    Ok(written)
}

/// Complete the partially written frame, if any.
fn write_pending<W>(output: &mut W, pending: &mut Vec<u8>) -> io::Result<()>
where
    W: io::Write + ?Sized,
{
    if pending.is_empty() {
        return Ok(());
    }
    let written = write_partial(output, pending)?;
    *pending = pending.split_off(written);
    if pending.is_empty() {
        Ok(())
    } else {
        Err(io::ErrorKind::WouldBlock.into())
    }
}

/// Write a frame without interleaving it with the bytes of another frame.
///
/// The frame is not written at all if the remainder of the previous frame
/// could not be completed. If only a part of the frame could be written
/// the rest is kept in `pending` and written first on the next call.
fn write_frame<W>(output: &mut W, pending: &mut Vec<u8>, frame: &[u8]) -> io::Result<()>
where
    W: io::Write + ?Sized,
{
    write_pending(output, pending)?;
    let written = write_partial(output, frame)?;
    pending.extend_from_slice(&frame[written..]);
    Ok(())
}
