//! Per-operation motion state machines.
//!
//! The hardware emits unsolicited status frames and explicit terminal frames
//! interchangeably, so every poll checks both signals and acts on whichever
//! arrives first.

mod controller;
mod operation;

pub use controller::{MotionConfig, MotionController, MotionError};
pub use operation::MotionOperation;
