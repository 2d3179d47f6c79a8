// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    ffi::{c_int, CStr, CString},
    io::{self, Read as _, Write as _},
    ptr,
};

use ::alsa::{card, rawmidi::Rawmidi, Direction};

use super::{list_card_ports, CardControl, Stream, SubdeviceNames};
use crate::{Error, RawMidiDevice, Result, Transport};

/// An open rawmidi stream.
#[allow(missing_debug_implementations)]
pub struct AlsaPort(Rawmidi);

impl io::Read for AlsaPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Self(rawmidi) = self;
        rawmidi.io().read(buf)
    }
}

impl io::Write for AlsaPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Self(rawmidi) = self;
        rawmidi.io().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens inputs in blocking mode, so that receiving waits for the next
/// message, and outputs in non-blocking mode, so that sending never stalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaTransport;

impl Transport for AlsaTransport {
    type Input = AlsaPort;
    type Output = AlsaPort;

    fn open_input(&self, address: &str) -> io::Result<Self::Input> {
        Rawmidi::new(address, Direction::Capture, false)
            .map(AlsaPort)
            .map_err(io::Error::other)
    }

    fn open_output(&self, address: &str) -> io::Result<Self::Output> {
        Rawmidi::new(address, Direction::Playback, true)
            .map(AlsaPort)
            .map_err(io::Error::other)
    }

    fn close_output(&self, output: &mut Self::Output) -> io::Result<()> {
        let AlsaPort(rawmidi) = output;
        rawmidi.drain().map_err(io::Error::other)
    }
}

pub type AlsaDevice = RawMidiDevice<AlsaTransport>;

fn check(code: c_int) -> io::Result<c_int> {
    if code < 0 {
        Err(io::Error::from_raw_os_error(-code))
    } else {
        Ok(code)
    }
}

/// Owned `snd_ctl_t` of a sound card.
///
/// The `alsa` crate does not expose the per-stream rawmidi queries, so
/// they are issued through `alsa-sys` directly.
struct CardCtl(*mut alsa_sys::snd_ctl_t);

impl CardCtl {
    #[allow(unsafe_code)]
    fn open(card: i32) -> io::Result<Self> {
        let name = CString::new(format!("hw:{card}")).map_err(io::Error::other)?;
        let mut handle = ptr::null_mut();
        // SAFETY: `name` is a valid C string that outlives the call
        check(unsafe { alsa_sys::snd_ctl_open(&mut handle, name.as_ptr(), 0) })?;
        Ok(Self(handle))
    }
}

impl Drop for CardCtl {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        let Self(handle) = *self;
        // SAFETY: `handle` was opened successfully and is closed only once
        if let Err(err) = check(unsafe { alsa_sys::snd_ctl_close(handle) }) {
            log::warn!("Failed to close ALSA control: {err}");
        }
    }
}

/// Owned `snd_rawmidi_info_t`, filled by a control query.
struct RawmidiInfo(*mut alsa_sys::snd_rawmidi_info_t);

impl RawmidiInfo {
    #[allow(unsafe_code)]
    fn query(ctl: &CardCtl, device: i32, subdevice: u32, stream: Stream) -> io::Result<Self> {
        let mut info = ptr::null_mut();
        // SAFETY: `info` is only wrapped after successful allocation
        check(unsafe { alsa_sys::snd_rawmidi_info_malloc(&mut info) })?;
        let info = Self(info);
        let device = u32::try_from(device).map_err(io::Error::other)?;
        let stream = match stream {
            Stream::Input => alsa_sys::SND_RAWMIDI_STREAM_INPUT,
            Stream::Output => alsa_sys::SND_RAWMIDI_STREAM_OUTPUT,
        };
        let CardCtl(handle) = *ctl;
        // SAFETY: both pointers are valid and owned by their wrappers
        unsafe {
            alsa_sys::snd_rawmidi_info_set_device(info.0, device);
            alsa_sys::snd_rawmidi_info_set_subdevice(info.0, subdevice);
            alsa_sys::snd_rawmidi_info_set_stream(info.0, stream);
            check(alsa_sys::snd_ctl_rawmidi_info(handle, info.0))?;
        }
        Ok(info)
    }

    #[allow(unsafe_code)]
    fn subdevice_count(&self) -> u32 {
        // SAFETY: the info has been filled by a successful query
        unsafe { alsa_sys::snd_rawmidi_info_get_subdevices_count(self.0) }
    }

    #[allow(unsafe_code)]
    fn names(&self) -> SubdeviceNames {
        let to_string = |name: *const std::ffi::c_char| {
            if name.is_null() {
                return String::new();
            }
            // SAFETY: non-null names are C strings owned by the info
            unsafe { CStr::from_ptr(name) }
                .to_string_lossy()
                .into_owned()
        };
        // SAFETY: the info has been filled by a successful query
        let (device_name, subdevice_name) = unsafe {
            (
                alsa_sys::snd_rawmidi_info_get_name(self.0),
                alsa_sys::snd_rawmidi_info_get_subdevice_name(self.0),
            )
        };
        SubdeviceNames {
            device_name: to_string(device_name),
            subdevice_name: to_string(subdevice_name),
        }
    }
}

impl Drop for RawmidiInfo {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: allocated by `snd_rawmidi_info_malloc`
        unsafe { alsa_sys::snd_rawmidi_info_free(self.0) };
    }
}

impl CardControl for CardCtl {
    #[allow(unsafe_code)]
    fn next_device(&mut self, device: i32) -> io::Result<Option<i32>> {
        let Self(handle) = *self;
        let mut device = device;
        // SAFETY: `handle` is open and `device` a valid out pointer
        check(unsafe { alsa_sys::snd_ctl_rawmidi_next_device(handle, &mut device) })?;
        Ok((device >= 0).then_some(device))
    }

    fn subdevice_count(&self, device: i32, stream: Stream) -> io::Result<u32> {
        RawmidiInfo::query(self, device, 0, stream).map(|info| info.subdevice_count())
    }

    fn subdevice_names(
        &self,
        device: i32,
        subdevice: u32,
        stream: Stream,
    ) -> io::Result<SubdeviceNames> {
        RawmidiInfo::query(self, device, subdevice, stream).map(|info| info.names())
    }
}

fn discovery_error(reason: String, source: io::Error) -> Error {
    Error::Discovery {
        reason: reason.into(),
        source,
    }
}

/// List the rawmidi ports of all sound cards.
pub fn list_devices() -> Result<Vec<AlsaDevice>> {
    let mut devices = Vec::new();
    let mut card_count = 0;
    for card in card::Iter::new() {
        let card = card.map_err(|err| {
            discovery_error("cannot determine card number".into(), io::Error::other(err))
        })?;
        card_count += 1;
        let index = card.get_index();
        log::debug!("Checking ALSA card {index}");
        let mut ctl = CardCtl::open(index)
            .map_err(|err| discovery_error(format!("cannot open control for card {index}"), err))?;
        let ports = list_card_ports(index, &mut ctl).map_err(|err| {
            discovery_error(format!("cannot get rawmidi information of card {index}"), err)
        })?;
        devices.extend(
            ports
                .into_iter()
                .map(|port| RawMidiDevice::new(port, AlsaTransport)),
        );
    }
    if card_count == 0 {
        return Err(Error::Discovery {
            reason: "cannot list ALSA MIDI devices".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no sound card found"),
        });
    }
    Ok(devices)
}
