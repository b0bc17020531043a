//! GPIO access for the key matrix.
//!
//! Rows are driven outputs, columns are inputs with pull-down bias, so a
//! closed switch reads high while its row is driven high. Only one row is
//! ever driven: every row write covers the whole row group.
//!
//! Pin mapping (BCM numbering on the Raspberry Pi header):
//!   Rows    (outputs):          6, 12, 13, 19, 16, 26, 20, 21
//!   Columns (inputs w/ pull-down): 4, 17, 18, 27, 22, 23, 24, 25, 5

use std::io;
use std::path::{Path, PathBuf};

use gpiocdev::line::{Bias, Offset, Value, Values};
use gpiocdev::{Chip, Request};
use tracing::info;

use m100_keymap::{COLS, ROWS};

use crate::error::{Error, Result};

pub const ROW_PINS: [Offset; ROWS] = [6, 12, 13, 19, 16, 26, 20, 21];
pub const COLUMN_PINS: [Offset; COLS] = [4, 17, 18, 27, 22, 23, 24, 25, 5];

/// Consumer label attached to the requested lines.
const CONSUMER: &str = "m100kbd";

/// Row driving and column sampling, as seen by the scanner.
pub trait MatrixIo {
    /// Drive `row` high (and every other row low), or drive all rows low.
    fn set_row(&mut self, row: usize, high: bool) -> Result<()>;

    /// Sample every column line into `columns`; `true` means high.
    fn read_columns(&mut self, columns: &mut [bool; COLS]) -> Result<()>;
}

/// Resolve a chip given either as a bare name (`gpiochip0`) or a path.
pub fn chip_path(chip: &str) -> PathBuf {
    if chip.contains('/') {
        PathBuf::from(chip)
    } else {
        Path::new("/dev").join(chip)
    }
}

fn gpio_error(err: gpiocdev::Error) -> io::Error {
    io::Error::other(err)
}

/// The matrix lines of one GPIO chip. Lines are released on drop.
pub struct GpioMatrix {
    rows: Request,
    columns: Request,
}

impl GpioMatrix {
    pub fn open(chip: &Path) -> Result<Self> {
        let chip_error = |err: gpiocdev::Error| Error::Chip {
            path: chip.to_path_buf(),
            source: gpio_error(err),
        };
        let info = Chip::from_path(chip)
            .and_then(|c| c.info())
            .map_err(chip_error)?;
        info!(chip = %chip.display(), label = %info.label, lines = info.num_lines, "opened GPIO chip");

        let columns = Request::builder()
            .on_chip(chip)
            .with_consumer(CONSUMER)
            .with_lines(&COLUMN_PINS)
            .as_input()
            .with_bias(Bias::PullDown)
            .request()
            .map_err(|err| Error::Lines {
                group: "column",
                offsets: COLUMN_PINS.to_vec(),
                source: gpio_error(err),
            })?;
        info!(pins = ?COLUMN_PINS, "configured column pins as inputs with pull-down");

        let rows = Request::builder()
            .on_chip(chip)
            .with_consumer(CONSUMER)
            .with_lines(&ROW_PINS)
            .as_output(Value::Inactive)
            .request()
            .map_err(|err| Error::Lines {
                group: "row",
                offsets: ROW_PINS.to_vec(),
                source: gpio_error(err),
            })?;
        info!(pins = ?ROW_PINS, "configured row pins as outputs");

        Ok(Self { rows, columns })
    }
}

impl MatrixIo for GpioMatrix {
    fn set_row(&mut self, row: usize, high: bool) -> Result<()> {
        let mut values = Values::default();
        for (idx, &pin) in ROW_PINS.iter().enumerate() {
            let value = if high && idx == row {
                Value::Active
            } else {
                Value::Inactive
            };
            values.set(pin, value);
        }
        self.rows
            .set_values(&values)
            .map_err(|err| Error::SetRow {
                row,
                high,
                source: gpio_error(err),
            })
    }

    fn read_columns(&mut self, columns: &mut [bool; COLS]) -> Result<()> {
        let mut values = Values::from_offsets(&COLUMN_PINS);
        self.columns
            .values(&mut values)
            .map_err(|err| Error::ReadColumns(gpio_error(err)))?;
        for (col, &pin) in COLUMN_PINS.iter().enumerate() {
            columns[col] = values.get(pin) == Some(Value::Active);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_path() {
        assert_eq!(chip_path("gpiochip0"), PathBuf::from("/dev/gpiochip0"));
        assert_eq!(chip_path("/dev/gpiochip4"), PathBuf::from("/dev/gpiochip4"));
    }

    #[test]
    fn test_pins_are_distinct() {
        let mut all: Vec<Offset> = ROW_PINS.iter().chain(COLUMN_PINS.iter()).copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), ROWS + COLS);
    }
}
