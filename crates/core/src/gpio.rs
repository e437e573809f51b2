//! Minimal Linux sysfs GPIO access
//!
//! Used for the status LEDs and for polling pulse inputs. Pin numbers are
//! BCM numbers.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Default sysfs GPIO root
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// udev needs a moment to fix permissions on a freshly exported pin
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// A single exported GPIO pin
#[derive(Debug)]
pub struct SysfsPin {
    pin: u32,
    dir: PathBuf,
}

impl SysfsPin {
    /// Export `pin` under the default sysfs root and set its direction
    pub fn open(pin: u32, direction: Direction) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), pin, direction)
    }

    /// Export `pin` under `root` and set its direction
    pub fn open_at(root: &Path, pin: u32, direction: Direction) -> Result<Self> {
        let dir = root.join(format!("gpio{}", pin));
        if !dir.exists() {
            fs::write(root.join("export"), pin.to_string())
                .with_context(|| format!("Failed to export GPIO {}", pin))?;
            thread::sleep(EXPORT_SETTLE);
        }
        fs::write(dir.join("direction"), direction.as_str())
            .with_context(|| format!("Failed to set direction of GPIO {}", pin))?;
        Ok(Self { pin, dir })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn write(&self, high: bool) -> Result<()> {
        fs::write(self.dir.join("value"), if high { "1" } else { "0" })
            .with_context(|| format!("Failed to write GPIO {}", self.pin))
    }

    pub fn read(&self) -> Result<bool> {
        let text = fs::read_to_string(self.dir.join("value"))
            .with_context(|| format!("Failed to read GPIO {}", self.pin))?;
        Ok(text.trim() == "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pin(root: &Path, pin: u32) {
        let dir = root.join(format!("gpio{}", pin));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
        fs::write(dir.join("value"), "0").unwrap();
    }

    #[test]
    fn test_write_and_read_back() {
        let root = tempfile::tempdir().unwrap();
        fake_pin(root.path(), 22);

        let pin = SysfsPin::open_at(root.path(), 22, Direction::Out).unwrap();
        let direction = fs::read_to_string(root.path().join("gpio22/direction")).unwrap();
        assert_eq!(direction, "out");

        pin.write(true).unwrap();
        assert!(pin.read().unwrap());
        pin.write(false).unwrap();
        assert!(!pin.read().unwrap());
    }

    #[test]
    fn test_missing_pin_is_exported() {
        let root = tempfile::tempdir().unwrap();
        // Export succeeds (plain file) but no gpio directory appears
        let result = SysfsPin::open_at(root.path(), 4, Direction::In);
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "4");
        assert!(result.is_err());
    }
}
