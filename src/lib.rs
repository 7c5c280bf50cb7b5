//! Brownout detection firmware for XMC microcontrollers.
//!
//! The supply-voltage monitor of the System Control Unit is programmed with a
//! per-series threshold and interval. When the supply sags below the threshold,
//! the interrupt (XMC1) or trap (XMC4) handler toggles the user LED and stops
//! at a breakpoint.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::unwrap_used)]

pub mod config;
pub mod firmware;
pub mod sysc;
