//! NeuroSAT: a message-passing network over the literal/clause graph of a
//! CNF formula that predicts whether the formula is satisfiable.
//!
//! [`neurosat`] holds the model itself, a pure function of its parameters and
//! a [`Batch`] of instances. [`train`] is the harness side: loss, gradient
//! clipping and the optimizer.

pub mod neurosat;
pub mod train;

pub use neurosat::{Batch, Error, Instance, Literal, NeuroSat, NeuroSatConfig, Result};
pub use train::{TrainConfig, Trainer};
