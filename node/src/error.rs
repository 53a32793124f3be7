use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] elector_store::StoreError),

    #[error("tool error: {0}")]
    Tool(#[from] elector_toolchain::ToolError),

    #[error("parse error: {0}")]
    Parse(#[from] elector_types::ParseError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Worker(String),
}

impl NodeError {
    /// Whether the process should stop rather than retry on the next tick.
    ///
    /// Only configuration problems and ledger failures qualify; everything
    /// that comes from the chain, a node or a tool is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NodeError::Store(_) | NodeError::Config(_) | NodeError::Worker(_)
        )
    }
}
