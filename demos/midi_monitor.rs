// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

//! Print all messages received from a MIDI device.
//!
//! Usage: `midi-monitor [<backend>] [<device index>]`, e.g. `midi-monitor alsa 1`.

use std::io::{stdin, stdout, Write as _};

use midiraw::{get_devices, Backend, ChannelMode, Device, Error, Message};

fn main() {
    pretty_env_logger::init();
    match run() {
        Ok(()) => (),
        Err(err) => println!("Error: {err}"),
    }
}

fn select_device(devices: &mut Vec<Box<dyn Device>>) -> anyhow::Result<Box<dyn Device>> {
    match devices.len() {
        0 => anyhow::bail!("no device found"),
        1 => {
            println!(
                "Choosing the only available device: {name}",
                name = devices[0].name()
            );
            Ok(devices.remove(0))
        }
        _ => {
            println!("\nAvailable devices:");
            for (i, device) in devices.iter().enumerate() {
                println!("{i}: {name}", name = device.name());
            }
            print!("Please select a device: ");
            stdout().flush()?;
            let mut input = String::new();
            stdin().read_line(&mut input)?;
            let index = input.trim().parse::<usize>()?;
            anyhow::ensure!(index < devices.len(), "no device with index {index}");
            Ok(devices.remove(index))
        }
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let backend = match args.next() {
        Some(backend) => backend,
        None => Backend::enabled()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no MIDI backend enabled"))?
            .to_string(),
    };
    let mut devices = get_devices(&backend)?;
    let mut device = match args.next() {
        Some(index) => {
            let index = index.parse::<usize>()?;
            anyhow::ensure!(index < devices.len(), "no device with index {index}");
            devices.remove(index)
        }
        None => select_device(&mut devices)?,
    };

    println!("{name}: opening", name = device.name());
    if device.is_output() {
        device.open_output()?;
        // Silence hanging notes from previous sessions
        for channel in 1..=16 {
            device.channel_mode(channel, ChannelMode::AllNotesOff);
        }
    }
    if !device.is_input() {
        println!("{name}: no input to monitor", name = device.name());
        device.close()?;
        return Ok(());
    }
    device.open_input()?;

    println!("Starting endless loop, press CTRL-C to exit...");
    let mut message = Message::default();
    loop {
        match device.receive(&mut message) {
            Ok(()) => println!("{name}: {message}", name = device.name()),
            Err(err @ (Error::Unsupported { .. } | Error::Protocol { .. })) => {
                log::warn!("Skipping MIDI input: {err}");
            }
            Err(err) => {
                device.close()?;
                return Err(err.into());
            }
        }
    }
}
