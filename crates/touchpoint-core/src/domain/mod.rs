//! Domain entities for Touchpoint.
//!
//! This module contains the gesture-to-protocol translation engine as pure,
//! synchronous state machines.  None of them own a clock or a timer: every
//! operation takes the current [`std::time::Instant`], and every "do this
//! later" decision is returned to the caller as a delay to schedule.  The
//! client crate owns the timers and feeds their firings back in.
//!
//! - [`input`] – raw local input events.
//! - [`config`] – tuning options shared by every state machine.
//! - [`gesture`] – tap-sequence classification and session start triggers.
//! - [`motion`] – rate-limited relative-displacement batching.
//! - [`keyboard`] – the keyboard control modality.

pub mod config;
pub mod gesture;
pub mod input;
pub mod keyboard;
pub mod motion;
