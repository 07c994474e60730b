// Magic Wand — Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the shared I2C bus and check the MPU6050 responds.
//   2. Build the gesture pipeline (classifier + decision parameters).
//   3. Spawn the sensor task (25 Hz sampling) and the inference task.
//
// The two tasks are joined by a bounded sample queue so a slow inference
// never stalls sampling.

#[cfg(target_os = "espidf")]
mod drivers;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("the firmware binary only runs on ESP-IDF targets; use `replay` on the host")
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use anyhow::Context;
    use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use magic_wand::config::*;
    use magic_wand::output::LogSink;
    use magic_wand::pipeline::PipelineController;
    use magic_wand::tasks;

    use crate::drivers::haptic::HapticDriver;
    use crate::drivers::imu::Mpu6050;

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("Magic Wand firmware starting…");

        // ---- Peripherals --------------------------------------------------
        let peripherals = Peripherals::take()?;

        // ---- I2C bus ------------------------------------------------------
        let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio6, // SDA
            peripherals.pins.gpio7, // SCL
            &i2c_config,
        )?;
        // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
        // It will live for the entire programme duration (embedded firmware never exits).
        let i2c_bus: &'static Mutex<I2cDriver<'static>> =
            Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));
        log::info!("I2C up on SDA=GPIO{} SCL=GPIO{}", PIN_I2C_SDA, PIN_I2C_SCL);

        // ---- Sensor self-test ---------------------------------------------
        let imu = Mpu6050::new(i2c_bus);
        if !imu.is_connected() {
            log::error!("Boot check FAILED — MPU6050 not responding");
            // Continue anyway so we can still debug via serial.
        }
        imu.init().context("MPU6050 init")?;

        // ---- Output -------------------------------------------------------
        let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
        // SAFETY: GPIO peripheral lives forever, same argument as I2C above.
        let haptic_static: PinDriver<'static, AnyOutputPin, Output> =
            unsafe { core::mem::transmute(haptic_pin) };
        log::info!("Haptic motor on GPIO{}", PIN_HAPTIC);
        let sink = (LogSink, HapticDriver::new(haptic_static));

        // ---- Pipeline -----------------------------------------------------
        let config = PipelineConfig::firmware()?;
        log::info!(
            "Pipeline: threshold {:.2}, refractory {} ticks, {:?}",
            config.decider.confidence_threshold(),
            config.decider.refractory_ticks(),
            config.normalization
        );
        let pipeline = PipelineController::new(config, classifier());

        // ---- Channels -----------------------------------------------------
        let (sample_tx, sample_rx) = mpsc::sync_channel(SAMPLE_QUEUE_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));

        // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) -----------

        // Sensor task: tightest timing.
        let sensor_stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("sensor".into())
            .stack_size(STACK_SENSOR)
            .spawn(move || {
                let (exit, stats) = tasks::sensor::sensor_task(imu, sample_tx, sensor_stop);
                log::warn!("Sensor task ended: {:?} {:?}", exit, stats);
            })?;

        // Inference task
        thread::Builder::new()
            .name("inference".into())
            .stack_size(STACK_INFERENCE)
            .spawn(move || {
                tasks::inference::inference_task(sample_rx, pipeline, sink);
            })?;

        // Main thread has nothing left to do; park it forever.
        // (All work happens in the spawned FreeRTOS tasks.)
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    #[cfg(feature = "tflm")]
    fn classifier() -> magic_wand::classifier::TflmClassifier {
        magic_wand::classifier::TflmClassifier::new(magic_wand::assembler::InputFormat::Float32)
    }

    #[cfg(not(feature = "tflm"))]
    fn classifier() -> magic_wand::classifier::HeuristicClassifier {
        log::warn!("No model linked — using heuristic classifier");
        magic_wand::classifier::HeuristicClassifier
    }
}
