// Magic Wand — MPU6050 Accelerometer Driver
//
// Register-level driver over a shared I2C bus.  Only the accelerometer is
// read; samples are reported in milli-g, the unit the model was trained on.

use std::sync::Mutex;

use anyhow::anyhow;
use esp_idf_hal::i2c::I2cDriver;

use magic_wand::config::*;
use magic_wand::events::Sample;
use magic_wand::tasks::sensor::SampleSource;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// MPU6050 register addresses
const REG_SMPLRT_DIV: u8 = 0x19;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 6-byte accel burst
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

pub struct Mpu6050 {
    bus: SharedBus,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, I2cDriver<'static>>> {
        self.bus.lock().map_err(|_| anyhow!("I2C bus mutex poisoned"))
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = self.lock() else {
            return false;
        };
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure accel (±8 g), DLPF 10 Hz, 25 Hz output.
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = self.lock()?;

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;

        // DLPF bandwidth 10 Hz (gyro output rate becomes 1 kHz)
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x05], I2C_TIMEOUT_TICKS)?;

        // 1 kHz / (1 + 39) = 25 Hz
        bus.write(I2C_ADDR_MPU6050, &[REG_SMPLRT_DIV, 39], I2C_TIMEOUT_TICKS)?;

        // Accelerometer: ±8 g
        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x10], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±8g, DLPF 10Hz, {} Hz)", TARGET_HZ);
        Ok(())
    }

    /// Burst-read the three accel axes and convert to milli-g.
    pub fn read_accel(&self) -> anyhow::Result<Sample> {
        let mut bus = self.lock()?;
        let mut raw = [0u8; 6];
        bus.write_read(
            I2C_ADDR_MPU6050,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        let to_mg = |hi: u8, lo: u8| i16::from_be_bytes([hi, lo]) as f32 / ACCEL_SCALE_8G * MILLI_G_PER_G;
        Ok(Sample::new(
            to_mg(raw[0], raw[1]),
            to_mg(raw[2], raw[3]),
            to_mg(raw[4], raw[5]),
        ))
    }
}

impl SampleSource for Mpu6050 {
    fn read_sample(&mut self) -> anyhow::Result<Sample> {
        self.read_accel()
    }
}
