use std::io;
use std::path::PathBuf;

use m100_keymap::Keycode;

/// Errors raised while talking to the GPIO chip or the virtual keyboard.
///
/// `Device`, `Chip` and `Lines` only happen at startup and are fatal. The
/// rest are reported during a sweep and skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create uinput device {name:?}")]
    Device {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to open GPIO chip {}", .path.display())]
    Chip {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to request {group} pins {offsets:?}")]
    Lines {
        group: &'static str,
        offsets: Vec<u32>,
        #[source]
        source: io::Error,
    },

    #[error("failed to read column values")]
    ReadColumns(#[source] io::Error),

    #[error("failed to set row {row} (active: {high})")]
    SetRow {
        row: usize,
        high: bool,
        #[source]
        source: io::Error,
    },

    #[error("failed to emit {action} for {key:?}")]
    Emit {
        action: &'static str,
        key: Keycode,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
