//! Convenience re-export of the public API.

pub use crate::config::Config;
pub use crate::error::CoreError;
pub use crate::node::Node;
pub use crate::packet::{Ack, Beacon, Data, DecodeError};
pub use crate::policy::Policy;
pub use crate::sensor::{Indicator, NullIndicator, SensorSource};
pub use crate::timer::Timer;

pub use crate::{
    CHANNEL_ACK, CHANNEL_BEACON, CHANNEL_DATA, HOPS_MAX, HOPS_UNKNOWN, NBR_CAP, NBR_TTL_MS,
    PRR_MIN_SAMPLES, SINK_ID, T_BC_MS, T_DATA_MS, T_PRINT_MS, T_RESELECT_MS, T_STARTUP_WAIT_MS,
};
