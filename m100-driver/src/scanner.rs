//! Matrix scan loop.
//!
//! Each tick sweeps the whole matrix: drive one row, let it settle, sample
//! the columns, turn column edges into host key events, release the row and
//! move on. Key state and modifier flags sit behind one mutex that is never
//! held while talking to the virtual keyboard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use m100_keymap::{modifier_at, COLS, ROWS};

use crate::config::Config;
use crate::device::{KeySink, VirtualKeyboard};
use crate::error::Result;
use crate::matrix::{GpioMatrix, MatrixIo};
use crate::state::{on_press, on_release, Dispatch, Emission, ModifierState, RowModifiers};
use crate::tracker::{KeyTracker, Level, Transition};

/// Longest stretch the loop sleeps without checking for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(20);

struct ScanState {
    keys: KeyTracker,
    modifiers: ModifierState,
}

impl ScanState {
    /// Decide what a press means and commit the new flags. `None` when the
    /// press falls inside the repeat window of a regular key.
    fn press(
        &mut self,
        row: usize,
        col: usize,
        held: RowModifiers,
        now: Instant,
        repeat_window: Duration,
    ) -> Option<Dispatch> {
        if modifier_at(row, col).is_none() && !self.keys.accept_press(row, col, now, repeat_window) {
            debug!(row, col, "press inside key repeat window dropped");
            return None;
        }
        let dispatch = on_press(self.modifiers, held, row, col);
        self.modifiers = dispatch.state;
        Some(dispatch)
    }

    fn release(&mut self, row: usize, col: usize) -> Dispatch {
        let dispatch = on_release(self.modifiers, row, col);
        self.modifiers = dispatch.state;
        dispatch
    }
}

pub struct Scanner<M, K> {
    config: Config,
    matrix: M,
    sink: K,
    /// Key state and modifier flags. The guard is always dropped before
    /// anything is sent to `sink`.
    state: Mutex<ScanState>,
}

fn lock(state: &Mutex<ScanState>) -> MutexGuard<'_, ScanState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scanner<GpioMatrix, VirtualKeyboard> {
    /// Acquire the virtual keyboard and the GPIO lines. Any failure here is
    /// fatal; whatever was acquired is released again on return.
    pub fn open(config: Config) -> Result<Self> {
        let sink = VirtualKeyboard::new()?;
        let matrix = GpioMatrix::open(&config.gpio_chip)?;
        Ok(Self::new(config, matrix, sink))
    }
}

impl<M: MatrixIo, K: KeySink> Scanner<M, K> {
    pub fn new(config: Config, matrix: M, sink: K) -> Self {
        Self {
            config,
            matrix,
            sink,
            state: Mutex::new(ScanState {
                keys: KeyTracker::new(),
                modifiers: ModifierState::default(),
            }),
        }
    }

    /// Snapshot of the current modifier flags.
    pub fn modifiers(&self) -> ModifierState {
        lock(&self.state).modifiers
    }

    /// Sweep the matrix once per scan interval until `cancel` is set.
    ///
    /// Cancellation is only observed between sweeps. A sweep that overruns
    /// the interval pushes the next one back instead of queueing extra
    /// sweeps.
    pub fn run(&mut self, cancel: &AtomicBool) {
        info!(
            scan_interval = ?self.config.scan_interval,
            debounce = ?self.config.settle_delay,
            key_repeat = ?self.config.key_repeat,
            "starting keyboard scanner"
        );

        let interval = self.config.scan_interval;
        let mut next_tick = Instant::now() + interval;
        while wait_until(next_tick, cancel) {
            self.scan_matrix();

            next_tick += interval;
            let now = Instant::now();
            if next_tick < now {
                next_tick = now + interval;
            }
        }

        info!("stopping keyboard scanner");
    }

    /// One full sweep over every row.
    pub fn scan_matrix(&mut self) {
        for row in 0..ROWS {
            self.scan_row(row);
        }
    }

    fn scan_row(&mut self, row: usize) {
        self.set_row(row, true);
        thread::sleep(self.config.settle_delay);

        let mut columns = [false; COLS];
        if let Err(err) = self.matrix.read_columns(&mut columns) {
            error!(row, error = %err, "failed to read column values");
            self.set_row(row, false);
            return;
        }

        let held = RowModifiers::sample(row, &columns);

        for (col, &high) in columns.iter().enumerate() {
            let dispatch = {
                let mut state = lock(&self.state);
                match state.keys.observe(row, col, Level::from(high)) {
                    Transition::None => None,
                    Transition::Pressed => {
                        state.press(row, col, held, Instant::now(), self.config.key_repeat)
                    }
                    Transition::Released => Some(state.release(row, col)),
                }
            };

            if let Some(dispatch) = dispatch {
                self.dispatch(row, col, high, dispatch);
            }
        }

        self.set_row(row, false);
    }

    fn dispatch(&mut self, row: usize, col: usize, pressed: bool, dispatch: Dispatch) {
        let Dispatch {
            state,
            emission,
            settle,
        } = dispatch;
        debug!(
            row,
            col,
            pressed,
            ?emission,
            shift = state.shift,
            ctrl = state.ctrl,
            alt = state.alt,
            code = state.code,
            "key {}",
            if pressed { "pressed" } else { "released" }
        );

        if let Some(emission) = emission {
            if let Err(err) = self.emit(emission) {
                error!(row, col, error = %err, "failed to emit key event");
            }
        }

        if settle {
            thread::sleep(self.config.post_key_delay);
        }
    }

    fn emit(&mut self, emission: Emission) -> Result<()> {
        match emission {
            Emission::KeyDown(key) => self.sink.key_down(key),
            Emission::KeyUp(key) => self.sink.key_up(key),
            Emission::Press(key) => self.sink.press(key),
            Emission::Combo { modifier, key } => self.sink.combo(modifier, key),
        }
    }

    /// Best effort: failures are logged and scanning carries on.
    fn set_row(&mut self, row: usize, high: bool) {
        if let Err(err) = self.matrix.set_row(row, high) {
            error!(row, high, error = %err, "failed to set row value");
        }
    }

    /// Drive every row low and release the lines and the virtual keyboard.
    pub fn close(mut self) -> Result<()> {
        info!(modifiers = ?self.modifiers(), "closing keyboard scanner");
        self.matrix.set_row(0, false)
    }
}

/// Sleep until `deadline`, waking up regularly to check `cancel`. Returns
/// `false` if cancelled first.
fn wait_until(deadline: Instant, cancel: &AtomicBool) -> bool {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}
