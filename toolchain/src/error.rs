use thiserror::Error;

/// Longest slice of tool output carried inside an error.
const MAX_OUTPUT_IN_ERROR: usize = 512;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} exited with {status}: {output}")]
    Failed {
        tool: String,
        status: String,
        output: String,
    },

    #[error("unexpected {tool} output (expected {expected}): {output}")]
    UnexpectedOutput {
        tool: &'static str,
        expected: &'static str,
        output: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed value: {0}")]
    Value(#[from] elector_types::ParseError),
}

impl ToolError {
    pub(crate) fn unexpected(tool: &'static str, expected: &'static str, output: &str) -> Self {
        ToolError::UnexpectedOutput {
            tool,
            expected,
            output: snippet(output),
        }
    }
}

/// Trim tool output to a size fit for a log line.
pub(crate) fn snippet(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.len() <= MAX_OUTPUT_IN_ERROR {
        return trimmed.to_string();
    }
    let mut end = MAX_OUTPUT_IN_ERROR;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
