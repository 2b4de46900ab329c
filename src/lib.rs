//! Benchmark sequence-to-sequence models for hydrological forecasting, together with the scores
//! used to rate their simulations.
//!
//! The models are built on a small N-dimensional [`tensor`] library and the layers in [`nn`].
//! They only run forward passes; parameters are drawn from the usual fan-in initializations.

#![deny(unsafe_code, rust_2018_idioms, rust_2021_compatibility)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;
pub mod models;
pub mod nn;
pub mod tensor;
