pub mod client;
pub mod error;
pub mod formulation;
pub mod protocol;
pub mod reconcile;
