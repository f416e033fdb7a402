pub mod config;
pub mod decode;
pub mod error;
pub mod events;
pub mod file_list;
pub mod indirection;
pub mod logging;
pub mod pause;
pub mod pipeline;
pub mod presenter;
pub mod queue;
pub mod sampler;
pub mod tasks {
    pub mod consumer;
    pub mod control;
    pub mod indexer;
    pub mod producer;
}
