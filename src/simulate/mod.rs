mod error;
mod propagation;
mod server;
mod tle;

pub use propagation::Simulator;
pub use server::run_simulator;
