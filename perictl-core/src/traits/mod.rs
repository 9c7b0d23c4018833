//! Hardware abstraction traits
//!
//! These traits define the interface between callers and the concrete
//! drivers in `perictl-drivers`.

pub mod actuator;
pub mod clock;
pub mod lifecycle;
pub mod sensor;
pub mod switch;

pub use actuator::{ActuatorDriver, ActuatorError};
pub use clock::Clock;
pub use lifecycle::Cleanup;
pub use sensor::{SensorError, SensorReader};
pub use switch::SwitchOutput;
