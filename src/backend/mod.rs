// SPDX-FileCopyrightText: The midiraw authors
// SPDX-License-Identifier: MPL-2.0

//! Discovery of devices by transport backend.

use strum::{EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

use crate::{Device, Error, Result};

pub mod alsa;

#[cfg(feature = "oss")]
pub mod oss;

/// Closed set of transport backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// ALSA rawmidi
    Alsa,
    /// OSS-style character devices
    Oss,
}

impl Backend {
    /// Whether support for this backend has been compiled in.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::Alsa => cfg!(all(feature = "alsa", target_os = "linux")),
            Self::Oss => cfg!(feature = "oss"),
        }
    }

    pub fn enabled() -> impl Iterator<Item = Self> {
        Self::iter().filter(|backend| backend.is_enabled())
    }

    /// List all devices in discovery order.
    ///
    /// Fails without partial results if any device could not be enumerated.
    pub fn list_devices(self) -> Result<Vec<Box<dyn Device>>> {
        log::debug!("Listing {self} MIDI devices");
        let devices = match self {
            Self::Alsa => list_alsa_devices()?,
            Self::Oss => list_oss_devices()?,
        };
        log::debug!("Found {count} {self} MIDI device(s)", count = devices.len());
        Ok(devices)
    }
}

#[cfg(any(not(all(feature = "alsa", target_os = "linux")), not(feature = "oss")))]
fn not_enabled(backend: Backend) -> Error {
    Error::Config {
        value: backend.to_string(),
        reason: "MIDI backend not enabled",
    }
}

#[cfg(all(feature = "alsa", target_os = "linux"))]
fn list_alsa_devices() -> Result<Vec<Box<dyn Device>>> {
    Ok(self::alsa::list_devices()?
        .into_iter()
        .map(|device| Box::new(device) as Box<dyn Device>)
        .collect())
}

#[cfg(not(all(feature = "alsa", target_os = "linux")))]
fn list_alsa_devices() -> Result<Vec<Box<dyn Device>>> {
    Err(not_enabled(Backend::Alsa))
}

#[cfg(feature = "oss")]
fn list_oss_devices() -> Result<Vec<Box<dyn Device>>> {
    Ok(self::oss::list_devices()?
        .into_iter()
        .map(|device| Box::new(device) as Box<dyn Device>)
        .collect())
}

#[cfg(not(feature = "oss"))]
fn list_oss_devices() -> Result<Vec<Box<dyn Device>>> {
    Err(not_enabled(Backend::Oss))
}

/// List all devices of the backend named `transport_name`, e.g. "alsa".
pub fn get_devices(transport_name: &str) -> Result<Vec<Box<dyn Device>>> {
    let backend = transport_name
        .parse::<Backend>()
        .map_err(|_| Error::Config {
            value: transport_name.to_owned(),
            reason: "unrecognized MIDI backend",
        })?;
    backend.list_devices()
}
