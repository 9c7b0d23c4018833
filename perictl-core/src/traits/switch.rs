//! On/off output trait

/// Trait for on/off outputs (relays, SSRs, MOSFET switches)
///
/// The logical state is independent of wiring polarity: `on` means the
/// load is energized whether the line is driven high or low for that.
pub trait SwitchOutput {
    /// Error from driving the output
    type Error;

    /// Turn the output on or off
    fn set_on(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Check if the output is currently on
    fn is_on(&self) -> bool;

    /// Turn the output on
    fn on(&mut self) -> Result<(), Self::Error> {
        self.set_on(true)
    }

    /// Turn the output off
    fn off(&mut self) -> Result<(), Self::Error> {
        self.set_on(false)
    }

    /// Flip the output
    fn toggle(&mut self) -> Result<(), Self::Error> {
        let on = self.is_on();
        self.set_on(!on)
    }
}
