// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use super::*;
use crate::{ChannelMode, Command, Device as _, Message};

fn new_device_dir(name: &str, file_names: &[&str]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "midiraw-oss-{name}-{pid}",
        pid = std::process::id()
    ));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).unwrap();
    for file_name in file_names {
        File::create(dir.join(file_name)).unwrap();
    }
    dir
}

#[test]
fn list_midi_device_files() {
    let dir = new_device_dir(
        "list",
        &["controlC0", "midiC1D0", "dmmidi1", "pcmC0D0p", "midi2"],
    );
    let devices = list_devices_in(&dir).unwrap();
    let labels = devices
        .iter()
        .map(|device| &*device.descriptor().label)
        .collect::<Vec<_>>();
    assert_eq!(vec!["midi2", "midiC1D0"], labels);
    let address = dir.join("midi2").to_string_lossy().into_owned();
    assert_eq!(address, devices[0].descriptor().address);
    assert_eq!(format!("midi2 ({address})"), devices[0].name());
    assert!(devices.iter().all(|device| device.is_input() && device.is_output()));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn list_missing_directory() {
    let dir = new_device_dir("missing", &[]);
    fs::remove_dir_all(&dir).unwrap();
    assert!(matches!(
        list_devices_in(&dir),
        Err(Error::Discovery { .. })
    ));
}

#[test]
fn open_missing_device_file() {
    let dir = new_device_dir("vanished", &["midi0"]);
    let mut devices = list_devices_in(&dir).unwrap();
    fs::remove_file(dir.join("midi0")).unwrap();
    assert!(matches!(
        devices[0].open_input(),
        Err(Error::Transport { .. })
    ));
    assert!(!devices[0].is_input_open());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn send_and_receive() {
    let dir = new_device_dir("loopback", &["midi0"]);
    let mut devices = list_devices_in(&dir).unwrap();
    let device = &mut devices[0];

    device.open_output().unwrap();
    device.note_on(2, 60, 127);
    device.program_change(3, 5);
    device.channel_mode(1, ChannelMode::AllSoundOff);
    device.close().unwrap();
    assert!(!device.is_output_open());

    device.open_input().unwrap();
    let mut message = Message::default();
    device.receive(&mut message).unwrap();
    assert_eq!(Message::channel_voice(Command::NoteOn, 1, 60, 127), message);
    device.receive(&mut message).unwrap();
    assert_eq!(Message::channel_voice(Command::ProgramChange, 2, 5, 0), message);
    device.receive(&mut message).unwrap();
    assert_eq!(
        Message::channel_voice(Command::ControllerChange, 0, 120, 0),
        message
    );
    assert!(matches!(device.receive(&mut message), Err(Error::Io(_))));
    device.close().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn receive_on_another_thread() {
    let dir = new_device_dir("thread", &["midi0"]);
    fs::write(dir.join("midi0"), [0xb0, 0x7b, 0x00]).unwrap();
    let mut devices = list_devices_in(&dir).unwrap();
    let mut device: Box<dyn crate::Device> = Box::new(devices.remove(0));
    device.open_input().unwrap();
    let message = std::thread::spawn(move || {
        let mut message = Message::default();
        device.receive(&mut message).unwrap();
        device.close().unwrap();
        assert!(!device.is_input_open());
        message
    })
    .join()
    .unwrap();
    assert_eq!(
        Message::channel_voice(Command::ControllerChange, 0, 123, 0),
        message
    );
    fs::remove_dir_all(&dir).ok();
}
