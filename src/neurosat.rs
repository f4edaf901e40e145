mod batch;
mod config;
mod error;
mod incidence;
mod instance;
mod lstm;
mod message_passing;
mod mlp;
mod model;
mod types;
mod vote;

pub use batch::Batch;
pub use config::NeuroSatConfig;
pub use error::{Error, Result};
pub use incidence::Incidence;
pub use instance::Instance;
pub use lstm::{LayerNormLstmCell, NodeState};
pub use message_passing::{MessagePassing, RoundState};
pub use mlp::Mlp;
pub use model::NeuroSat;
pub use types::{complement_node, ClauseSize, Literal, VariableSize};
pub use vote::Vote;
