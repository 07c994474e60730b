pub mod inference;
pub mod sensor;
