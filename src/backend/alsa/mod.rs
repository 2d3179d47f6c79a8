// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

//! ALSA rawmidi backend.
//!
//! Ports are addressed by their hardware name, either `hw:<card>,<device>`
//! or `hw:<card>,<device>,<subdevice>`.

use std::{borrow::Cow, io};

use crate::PortDescriptor;

#[cfg(all(feature = "alsa", target_os = "linux"))]
mod native;
#[cfg(all(feature = "alsa", target_os = "linux"))]
pub use self::native::{list_devices, AlsaDevice, AlsaPort, AlsaTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Input,
    Output,
}

/// Names reported for a rawmidi subdevice, both might be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdeviceNames {
    pub device_name: String,
    pub subdevice_name: String,
}

/// Rawmidi queries on the control interface of a single sound card.
pub trait CardControl {
    /// The rawmidi device following `device`.
    ///
    /// Enumeration starts with `device = -1`. Returns `None` after the
    /// last device.
    fn next_device(&mut self, device: i32) -> io::Result<Option<i32>>;

    fn subdevice_count(&self, device: i32, stream: Stream) -> io::Result<u32>;

    fn subdevice_names(
        &self,
        device: i32,
        subdevice: u32,
        stream: Stream,
    ) -> io::Result<SubdeviceNames>;
}

/// Collect the ports of all rawmidi devices of a card in discovery order.
pub fn list_card_ports(
    card: i32,
    control: &mut impl CardControl,
) -> io::Result<Vec<PortDescriptor>> {
    let mut ports = Vec::new();
    let mut device = -1;
    while let Some(next_device) = control.next_device(device)? {
        device = next_device;
        ports.extend(list_device_ports(card, device, &*control)?);
    }
    Ok(ports)
}

/// Collect the ports of a single rawmidi device.
///
/// A failed subdevice count query counts as no subdevices for that stream.
/// A device whose first subdevice has no name is listed only once and
/// addressed without a subdevice number, using the device name as label.
fn list_device_ports(
    card: i32,
    device: i32,
    control: &impl CardControl,
) -> io::Result<Vec<PortDescriptor>> {
    let subdevice_count = |stream: Stream| {
        control
            .subdevice_count(device, stream)
            .unwrap_or_else(|err| {
                log::debug!(
                    "No {stream:?} subdevices for ALSA device hw:{card},{device}: {err}"
                );
                0
            })
    };
    let input_count = subdevice_count(Stream::Input);
    let output_count = subdevice_count(Stream::Output);
    let mut ports = Vec::new();
    for subdevice in 0..input_count.max(output_count) {
        let is_input = subdevice < input_count;
        let is_output = subdevice < output_count;
        let stream = if is_input {
            Stream::Input
        } else {
            Stream::Output
        };
        let SubdeviceNames {
            device_name,
            subdevice_name,
        } = control.subdevice_names(device, subdevice, stream)?;
        if subdevice == 0 && subdevice_name.is_empty() {
            let port = PortDescriptor {
                label: Cow::Owned(device_name),
                address: format!("hw:{card},{device}"),
                is_input,
                is_output,
            };
            log::debug!("Found ALSA MIDI port {port}");
            ports.push(port);
            break;
        }
        let port = PortDescriptor {
            label: Cow::Owned(subdevice_name),
            address: format!("hw:{card},{device},{subdevice}"),
            is_input,
            is_output,
        };
        log::debug!("Found ALSA MIDI port {port}");
        ports.push(port);
    }
    Ok(ports)
}

#[cfg(test)]
mod tests;
