use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("{name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write error: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} stage panicked")]
    StagePanicked(&'static str),
}

impl SiftError {
    pub fn read(name: &str, source: std::io::Error) -> Self {
        SiftError::Read {
            name: name.to_string(),
            source,
        }
    }

    /// True when the failure is only the downstream end of the pipe going away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            SiftError::Write { source } if source.kind() == std::io::ErrorKind::BrokenPipe
        )
    }
}

impl From<std::io::Error> for SiftError {
    fn from(source: std::io::Error) -> Self {
        SiftError::Write { source }
    }
}
