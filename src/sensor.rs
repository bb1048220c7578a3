//! Sensor and indicator capabilities.
//!
//! Neither participates in the routing protocol; both are abstracted as
//! small traits so tests can stub them out, following the teacher's habit
//! of carrying hardware capabilities as bounded generic parameters instead
//! of hard dependencies.

/// Produces a 16-bit raw sensor code on demand.
pub trait SensorSource {
    fn sample(&mut self) -> u16;
}

/// Debug-only visual indicator, blinked once per sink beacon.
pub trait Indicator {
    fn blink(&mut self);
}

/// An `Indicator` that does nothing, for nodes or tests with no LED.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn blink(&mut self) {}
}

#[cfg(any(test, feature = "mocks"))]
pub mod mock {
    use super::SensorSource;

    /// A `SensorSource` that always returns the same fixed code.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedSensor(pub u16);

    impl SensorSource for FixedSensor {
        fn sample(&mut self) -> u16 {
            self.0
        }
    }
}
