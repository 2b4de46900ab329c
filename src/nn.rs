//! Neural network layers built on top of [`crate::tensor`].
//!
//! Layers own their parameters and are initialised from a caller-supplied random number generator
//! so that a model can be rebuilt identically from a seed.

mod conv;
pub use conv::{Conv1d, ConvConfig};

mod dropout;
pub use dropout::dropout;

mod init;
pub use init::{init, Init};

mod linear;
pub use linear::Linear;

mod module;
pub use module::Module;

mod rnn;
pub use rnn::{CellKind, Rnn, RnnConfig};
