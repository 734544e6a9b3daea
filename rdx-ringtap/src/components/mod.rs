//! Stateful building blocks driven by the round controller.

pub mod intro;
pub mod target;
