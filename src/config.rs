//! Tunable constants and runtime configuration for a [`crate::node::Node`].

use crate::policy::Policy;

/// Runtime-configurable parameters of the routing kernel.
///
/// Defaults match the tunable constants table of the protocol
/// specification; a concrete deployment may override any of them (for
/// example to shorten timers for simulation or testing).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Sink beacon interval, in milliseconds.
    pub t_bc_ms: u32,
    /// Data sampling interval, in milliseconds.
    pub t_data_ms: u32,
    /// Parent reselection interval, in milliseconds.
    pub t_reselect_ms: u32,
    /// Diagnostic snapshot interval, in milliseconds.
    pub t_print_ms: u32,
    /// Quiescent period after startup before the sink starts beaconing.
    pub t_startup_wait_ms: u32,
    /// Neighbor aging timeout, in milliseconds.
    pub nbr_ttl_ms: u32,
    /// Minimum transmit samples before a neighbor's PRR score is trusted.
    pub prr_min_samples: u32,
    /// Active parent-selection scoring policy.
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            t_bc_ms: crate::T_BC_MS,
            t_data_ms: crate::T_DATA_MS,
            t_reselect_ms: crate::T_RESELECT_MS,
            t_print_ms: crate::T_PRINT_MS,
            t_startup_wait_ms: crate::T_STARTUP_WAIT_MS,
            nbr_ttl_ms: crate::NBR_TTL_MS,
            prr_min_samples: crate::PRR_MIN_SAMPLES,
            policy: Policy::Prr,
        }
    }
}
