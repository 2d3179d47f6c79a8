// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeMap;

use super::*;

#[derive(Debug, Default)]
struct MockDevice {
    name: String,
    /// Subdevice names of the input and output streams, `None` if the
    /// count query fails.
    inputs: Option<Vec<&'static str>>,
    outputs: Option<Vec<&'static str>>,
    fail_names: bool,
}

#[derive(Debug, Default)]
struct MockCard {
    devices: BTreeMap<i32, MockDevice>,
    fail_next_device: bool,
}

impl MockCard {
    fn with_device(mut self, device: i32, info: MockDevice) -> Self {
        self.devices.insert(device, info);
        self
    }

    fn device(&self, device: i32) -> io::Result<&MockDevice> {
        self.devices
            .get(&device)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn stream_names(&self, device: i32, stream: Stream) -> io::Result<&[&'static str]> {
        let device = self.device(device)?;
        let names = match stream {
            Stream::Input => &device.inputs,
            Stream::Output => &device.outputs,
        };
        names
            .as_deref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

impl CardControl for MockCard {
    fn next_device(&mut self, device: i32) -> io::Result<Option<i32>> {
        if self.fail_next_device {
            return Err(io::Error::other("control closed"));
        }
        Ok(self
            .devices
            .range(device + 1..)
            .next()
            .map(|(device, _)| *device))
    }

    fn subdevice_count(&self, device: i32, stream: Stream) -> io::Result<u32> {
        let count = self.stream_names(device, stream)?.len();
        Ok(u32::try_from(count).unwrap())
    }

    fn subdevice_names(
        &self,
        device: i32,
        subdevice: u32,
        stream: Stream,
    ) -> io::Result<SubdeviceNames> {
        if self.device(device)?.fail_names {
            return Err(io::Error::other("no such subdevice"));
        }
        let subdevice_name = self
            .stream_names(device, stream)?
            .get(subdevice as usize)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(SubdeviceNames {
            device_name: self.device(device)?.name.clone(),
            subdevice_name: (*subdevice_name).to_owned(),
        })
    }
}

fn names(ports: &[PortDescriptor]) -> Vec<String> {
    ports.iter().map(ToString::to_string).collect()
}

#[test]
fn named_subdevices() {
    let mut card = MockCard::default().with_device(
        0,
        MockDevice {
            name: "UM-ONE".to_owned(),
            inputs: Some(vec!["UM-ONE MIDI 1", "UM-ONE MIDI 2"]),
            outputs: Some(vec!["UM-ONE MIDI 1"]),
            ..Default::default()
        },
    );
    let ports = list_card_ports(1, &mut card).unwrap();
    assert_eq!(
        vec![
            "UM-ONE MIDI 1 (hw:1,0,0)".to_owned(),
            "UM-ONE MIDI 2 (hw:1,0,1)".to_owned(),
        ],
        names(&ports)
    );
    assert!(ports[0].is_input);
    assert!(ports[0].is_output);
    assert!(ports[1].is_input);
    assert!(!ports[1].is_output);
}

#[test]
fn unnamed_first_subdevice_uses_device_name() {
    let mut card = MockCard::default().with_device(
        0,
        MockDevice {
            name: "Keystation MIDI".to_owned(),
            inputs: Some(vec!["", ""]),
            outputs: Some(vec![""]),
            ..Default::default()
        },
    );
    let ports = list_card_ports(2, &mut card).unwrap();
    assert_eq!(vec!["Keystation MIDI (hw:2,0)".to_owned()], names(&ports));
    assert!(ports[0].is_input);
    assert!(ports[0].is_output);
}

#[test]
fn failed_subdevice_count_degrades_to_none() {
    let mut card = MockCard::default()
        .with_device(
            0,
            MockDevice {
                name: "Synth".to_owned(),
                inputs: None,
                outputs: Some(vec!["Synth Out"]),
                ..Default::default()
            },
        )
        .with_device(
            1,
            MockDevice {
                name: "Pad".to_owned(),
                inputs: Some(vec!["Pad In"]),
                outputs: None,
                ..Default::default()
            },
        )
        .with_device(
            2,
            MockDevice {
                name: "Gone".to_owned(),
                ..Default::default()
            },
        );
    let ports = list_card_ports(0, &mut card).unwrap();
    assert_eq!(
        vec![
            "Synth Out (hw:0,0,0)".to_owned(),
            "Pad In (hw:0,1,0)".to_owned(),
        ],
        names(&ports)
    );
    assert!(!ports[0].is_input);
    assert!(ports[0].is_output);
    assert!(ports[1].is_input);
    assert!(!ports[1].is_output);
}

#[test]
fn multiple_devices_keep_discovery_order() {
    let mut card = MockCard::default()
        .with_device(
            0,
            MockDevice {
                name: "Card".to_owned(),
                inputs: Some(vec![""]),
                outputs: Some(vec![""]),
                ..Default::default()
            },
        )
        .with_device(
            3,
            MockDevice {
                name: "Card".to_owned(),
                inputs: Some(vec!["Port A"]),
                ..Default::default()
            },
        );
    let ports = list_card_ports(1, &mut card).unwrap();
    assert_eq!(
        vec!["Card (hw:1,0)".to_owned(), "Port A (hw:1,3,0)".to_owned()],
        names(&ports)
    );
}

#[test]
fn failed_subdevice_query_aborts() {
    let mut card = MockCard::default().with_device(
        0,
        MockDevice {
            name: "Broken".to_owned(),
            inputs: Some(vec!["In"]),
            fail_names: true,
            ..Default::default()
        },
    );
    assert!(list_card_ports(0, &mut card).is_err());
}

#[test]
fn failed_device_enumeration_aborts() {
    let mut card = MockCard {
        fail_next_device: true,
        ..Default::default()
    };
    assert!(list_card_ports(0, &mut card).is_err());
}

#[test]
fn no_devices() {
    assert!(list_card_ports(0, &mut MockCard::default())
        .unwrap()
        .is_empty());
}
