// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

//! OSS-style MIDI character devices, e.g. `/dev/snd/midiC1D0`.

use std::{
    borrow::Cow,
    fs::{self, File, OpenOptions},
    io,
    path::Path,
};

use crate::{Error, PortDescriptor, RawMidiDevice, Result, Transport};

pub const DEFAULT_DEVICE_DIR: &str = "/dev/snd";

/// Reads and writes the device file, reads block until input is available.
///
/// Closing drops the file handle. Errors reported by the OS when closing
/// the file are ignored, so closing an OSS device never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OssTransport;

impl Transport for OssTransport {
    type Input = File;
    type Output = File;

    fn open_input(&self, address: &str) -> io::Result<Self::Input> {
        OpenOptions::new().read(true).open(address)
    }

    fn open_output(&self, address: &str) -> io::Result<Self::Output> {
        OpenOptions::new().write(true).open(address)
    }
}

pub type OssDevice = RawMidiDevice<OssTransport>;

fn is_midi_device_file(file_name: &str) -> bool {
    // dmmidi devices carry timing information and no plain MIDI bytes
    file_name.contains("midi") && !file_name.contains("dmmidi")
}

/// List the MIDI devices in [`DEFAULT_DEVICE_DIR`].
pub fn list_devices() -> Result<Vec<OssDevice>> {
    list_devices_in(DEFAULT_DEVICE_DIR)
}

/// List the MIDI devices in `dir`, ordered by file name.
///
/// All devices are reported as both input and output.
pub fn list_devices_in(dir: impl AsRef<Path>) -> Result<Vec<OssDevice>> {
    let dir = dir.as_ref();
    let discovery_error = |source: io::Error| Error::Discovery {
        reason: format!("cannot read MIDI device directory {}", dir.display()).into(),
        source,
    };
    let mut file_names = fs::read_dir(dir)
        .map_err(discovery_error)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(discovery_error)?
        .into_iter()
        .filter_map(|file_name| file_name.into_string().ok())
        .filter(|file_name| is_midi_device_file(file_name))
        .collect::<Vec<_>>();
    file_names.sort_unstable();
    let devices = file_names
        .into_iter()
        .map(|file_name| {
            let address = dir.join(&file_name).to_string_lossy().into_owned();
            let port = PortDescriptor {
                label: Cow::Owned(file_name),
                address,
                is_input: true,
                is_output: true,
            };
            log::debug!("Found OSS MIDI device {port}");
            RawMidiDevice::new(port, OssTransport)
        })
        .collect();
    Ok(devices)
}

#[cfg(test)]
mod tests;
