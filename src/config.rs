//! Timing and discovery constants.

use std::time::Duration;

/// USB vendor id of Tektronix, as it appears in VISA resource addresses (`USB0::0x0699::...`
/// or `USB0::1689::...`).
pub const TEKTRONIX_VENDOR_ID: u16 = 0x0699;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfiguration {
    /// Pause after every write, before the error queue is polled. Shorter pauses overrun the
    /// input buffer of the instrument.
    pub write_delay: Duration,
    /// Pause after `*RST`. The instrument does not respond while it is resetting.
    pub reset_delay: Duration,
    pub manufacturer_id: u16,
    /// Timeout passed to [`ResourceManager::open`](crate::sys::ResourceManager::open) by
    /// [`Device::connect`](crate::Device::connect).
    pub timeout: Duration,
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self {
            write_delay: Duration::from_millis(100),
            reset_delay: Duration::from_millis(500),
            manufacturer_id: TEKTRONIX_VENDOR_ID,
            timeout: Duration::from_secs(2),
        }
    }
}

impl DeviceConfiguration {
    /// Configuration without any pauses; meant for simulated instruments.
    pub fn immediate() -> Self {
        Self {
            write_delay: Duration::ZERO,
            reset_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}
