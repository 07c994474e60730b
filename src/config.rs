// Magic Wand — Pipeline & Hardware Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) + MPU6050

use crate::assembler::Normalization;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Model input contract (fixed at build time)
// ---------------------------------------------------------------------------
pub const TARGET_HZ: u32 = 25;                      // Expected accelerometer sample rate
pub const TICK_PERIOD_MS: u64 = 1000 / TARGET_HZ as u64; // 40 ms

pub const INPUT_BATCH_COUNT: usize = 1;
pub const INPUT_SAMPLE_COUNT: usize = 128;
pub const INPUT_CHANNEL_COUNT: usize = 3;           // x, y, z
pub const INPUT_ELEMENT_COUNT: usize =
    INPUT_BATCH_COUNT * INPUT_SAMPLE_COUNT * INPUT_CHANNEL_COUNT; // 384
pub const INPUT_BYTE_COUNT: usize = INPUT_ELEMENT_COUNT * core::mem::size_of::<f32>();

pub const GESTURE_COUNT: usize = 4;                 // wing, ring, slope, no-gesture

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_HAPTIC: i32 = 4;      // D2/A2 — Haptic motor control
pub const PIN_I2C_SDA: i32 = 6;     // D4    — I2C data line
pub const PIN_I2C_SCL: i32 = 7;     // D5    — I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_INFERENCE: usize = 16384;

// ---------------------------------------------------------------------------
// Firmware decision parameters
// ---------------------------------------------------------------------------
pub const SAMPLE_QUEUE_DEPTH: usize = 32;           // ~1.3 s of samples in flight
pub const FIRMWARE_CONFIDENCE_THRESHOLD: f32 = 0.8;
pub const FIRMWARE_REFRACTORY_TICKS: u32 = TARGET_HZ; // 1 second
pub const HAPTIC_PULSE_MS: u64 = 80;

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_8G: f32 = 4096.0;   // LSB/g at ±8 g
pub const MILLI_G_PER_G: f32 = 1000.0;

// ---------------------------------------------------------------------------
// Runtime decision configuration
// ---------------------------------------------------------------------------

/// Parameters for turning class scores into debounced gesture events.
///
/// Neither value has a default: the model does not define what counts as a
/// positive trigger, so every caller states it explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeciderConfig {
    confidence_threshold: f32,
    refractory_ticks: u32,
}

impl DeciderConfig {
    pub fn new(confidence_threshold: f32, refractory_ticks: u32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(confidence_threshold));
        }
        if refractory_ticks == 0 {
            return Err(ConfigError::ZeroRefractory);
        }
        Ok(Self {
            confidence_threshold,
            refractory_ticks,
        })
    }

    /// Minimum winning score for a gesture to count (inclusive).
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Minimum number of ticks between two emitted gestures.
    pub fn refractory_ticks(&self) -> u32 {
        self.refractory_ticks
    }
}

/// Everything the pipeline controller needs besides its classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub decider: DeciderConfig,
    pub normalization: Normalization,
}

impl PipelineConfig {
    pub fn new(decider: DeciderConfig) -> Self {
        Self {
            decider,
            normalization: Normalization::None,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Values flashed onto the wand.
    pub fn firmware() -> Result<Self, ConfigError> {
        let decider = DeciderConfig::new(FIRMWARE_CONFIDENCE_THRESHOLD, FIRMWARE_REFRACTORY_TICKS)?;
        Ok(Self::new(decider).with_normalization(Normalization::GravityRemoval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_shape_constants() {
        assert_eq!(INPUT_ELEMENT_COUNT, 384);
        assert_eq!(INPUT_BYTE_COUNT, 1536);
        assert_eq!(TICK_PERIOD_MS, 40);
    }

    #[test]
    fn test_decider_config_validation() {
        let cfg = DeciderConfig::new(0.3, 10).unwrap();
        assert_eq!(cfg.confidence_threshold(), 0.3);
        assert_eq!(cfg.refractory_ticks(), 10);
        assert!(DeciderConfig::new(0.0, 1).is_ok());
        assert!(DeciderConfig::new(1.0, 1).is_ok());
        assert_eq!(
            DeciderConfig::new(-0.1, 10),
            Err(ConfigError::ThresholdOutOfRange(-0.1))
        );
        assert!(matches!(
            DeciderConfig::new(f32::NAN, 10),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
        assert_eq!(
            DeciderConfig::new(1.5, 10),
            Err(ConfigError::ThresholdOutOfRange(1.5))
        );
        assert_eq!(DeciderConfig::new(0.3, 0), Err(ConfigError::ZeroRefractory));
    }

    #[test]
    fn test_firmware_config() {
        let cfg = PipelineConfig::firmware().unwrap();
        assert_eq!(cfg.decider.refractory_ticks(), 25);
        assert_eq!(cfg.normalization, Normalization::GravityRemoval);
    }
}
