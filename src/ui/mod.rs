// UI module - host shell adapter
//
// This module contains:
// - bridge: JSON-line host events in, rendered state changes out
// - ShellController: reactor that wires host events to the dispatcher and action gate

pub mod bridge;
pub mod controller;

pub use bridge::{HostEvent, parse_host_event, render_change, spawn_renderer};
pub use controller::ShellController;
