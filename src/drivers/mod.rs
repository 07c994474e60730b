pub mod haptic;
pub mod imu;
