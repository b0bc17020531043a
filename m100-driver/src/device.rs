//! Virtual keyboard the host sees, backed by uinput.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::info;

use m100_keymap::{Keycode, CODE_COMBOS, KEYMAP};

use crate::error::{Error, Result};

/// Product name advertised to the host.
pub const DEVICE_NAME: &str = "TRS-80 M100 Keyboard";

const KEY_UP: i32 = 0;
const KEY_DOWN: i32 = 1;

/// Destination for synthesized key events.
pub trait KeySink {
    fn key_down(&mut self, key: Keycode) -> Result<()>;

    fn key_up(&mut self, key: Keycode) -> Result<()>;

    /// Down then up.
    fn press(&mut self, key: Keycode) -> Result<()> {
        self.key_down(key)?;
        self.key_up(key)
    }

    /// Hold `modifier` around a press of `key`. The modifier is released
    /// even if the tap fails; the first error is returned.
    fn combo(&mut self, modifier: Keycode, key: Keycode) -> Result<()> {
        self.key_down(modifier)?;
        let tapped = self.press(key);
        let released = self.key_up(modifier);
        tapped.and(released)
    }
}

pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Create the uinput device, advertising every key the matrix and the
    /// CODE layer can produce.
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for kc in KEYMAP.iter().flatten() {
            keys.insert(Key::new(kc.code()));
        }
        for combo in CODE_COMBOS.iter() {
            keys.insert(Key::new(combo.key.code()));
        }

        let device_error = |source: std::io::Error| Error::Device {
            name: DEVICE_NAME,
            source,
        };
        let device = VirtualDeviceBuilder::new()
            .map_err(device_error)?
            .name(DEVICE_NAME)
            .with_keys(&keys)
            .map_err(device_error)?
            .build()
            .map_err(device_error)?;

        info!(name = DEVICE_NAME, "created uinput keyboard device");
        Ok(Self { device })
    }

    /// Write one key event; the batch is terminated with a SYN_REPORT.
    fn write(&mut self, key: Keycode, value: i32, action: &'static str) -> Result<()> {
        let event = InputEvent::new(EventType::KEY, key.code(), value);
        self.device
            .emit(&[event])
            .map_err(|source| Error::Emit {
                action,
                key,
                source,
            })
    }
}

impl KeySink for VirtualKeyboard {
    fn key_down(&mut self, key: Keycode) -> Result<()> {
        self.write(key, KEY_DOWN, "key down")
    }

    fn key_up(&mut self, key: Keycode) -> Result<()> {
        self.write(key, KEY_UP, "key up")
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        info!("closed uinput keyboard device");
    }
}
