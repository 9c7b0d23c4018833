//! Temperature sensor drivers

pub mod ds18b20;
pub mod retrying;

pub use ds18b20::{Ds18b20, Ds18b20Format};
pub use retrying::RetryingSensor;
