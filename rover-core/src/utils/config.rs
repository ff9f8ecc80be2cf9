//! Runtime configuration for the rover.
//!
//! Every field has a default matching the stock robot, so an empty JSON object
//! (`{}`) is a valid configuration.

use serde::{Deserialize, Serialize};
use smart_leds_trait::RGB8;

pub const RED: RGB8 = RGB8 { r: 200, g: 0, b: 0 };
pub const GREEN: RGB8 = RGB8 { r: 0, g: 200, b: 0 };
pub const BLUE: RGB8 = RGB8 { r: 0, g: 0, b: 200 };
pub const PURPLE: RGB8 = RGB8 { r: 120, g: 0, b: 160 };
pub const YELLOW: RGB8 = RGB8 { r: 100, g: 100, b: 0 };

/// Length of the Aux1 emergency-stop hold.
pub const ESTOP_PULSE_MS: u32 = 500;

/// Number of pixels on the underglow strip.
pub const UNDERGLOW_LEN: usize = 2;

/// Top-level configuration handed to [`RobotController::new`].
///
/// [`RobotController::new`]: crate::utils::RobotController::new
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub palette: Palette,
    /// How long Aux1 holds the wheels at zero with the alert color shown.
    pub estop_pulse_ms: u32,
    pub underglow_len: usize,
    pub servo: ServoConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            estop_pulse_ms: ESTOP_PULSE_MS,
            underglow_len: UNDERGLOW_LEN,
            servo: ServoConfig::default(),
        }
    }
}

/// Fixed colors used by the indicator controller.
///
/// Colors serialize as `[r, g, b]` triplets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Underglow at power-on.
    #[serde(with = "rgb_triplet")]
    pub default_underglow: RGB8,
    /// Shown while Left or Right is held.
    #[serde(with = "rgb_triplet")]
    pub turn_highlight: RGB8,
    /// Shown for the duration of the emergency stop.
    #[serde(with = "rgb_triplet")]
    pub alert: RGB8,
    #[serde(with = "rgb_triplet")]
    pub aux2: RGB8,
    #[serde(with = "rgb_triplet")]
    pub aux3: RGB8,
    #[serde(with = "rgb_triplet")]
    pub aux4: RGB8,
    /// Status pixel while waiting for a central to connect.
    #[serde(with = "rgb_triplet")]
    pub advertising: RGB8,
    /// Status pixel once a central is connected.
    #[serde(with = "rgb_triplet")]
    pub connected: RGB8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            default_underglow: PURPLE,
            turn_highlight: YELLOW,
            alert: RED,
            aux2: GREEN,
            aux3: BLUE,
            aux4: PURPLE,
            advertising: BLUE,
            connected: GREEN,
        }
    }
}

/// Calibration for the continuous-rotation servos behind [`ServoDrive`].
///
/// [`ServoDrive`]: crate::utils::controllers::servo::ServoDrive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// 7-bit I2C address of the PCA9685.
    pub address: u8,
    pub frequency_hz: f32,
    /// Pulse width at full reverse (µs).
    pub min_pulse_us: f32,
    /// Pulse width at full forward (µs).
    pub max_pulse_us: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            address: 0x40,
            frequency_hz: 50.0,
            min_pulse_us: 600.0,
            max_pulse_us: 2400.0,
        }
    }
}

/// Serde adapter storing an `RGB8` as a `[r, g, b]` array.
pub mod rgb_triplet {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use smart_leds_trait::RGB8;

    pub fn serialize<S: Serializer>(
        color: &RGB8,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        [color.r, color.g, color.b].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RGB8, D::Error> {
        let [r, g, b] = <[u8; 3]>::deserialize(deserializer)?;
        Ok(RGB8 { r, g, b })
    }
}
