use serde::Serialize;

/// Where a job currently is in its tick cycle.
///
/// ```text
/// Idle -> Fetching -> Parsing -> Persisting -> Idle
///            |           |
///            +-> Failed -+-> Idle
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Fetching,
    Parsing,
    Persisting,
    Failed,
}

impl JobState {
    /// `true` while a tick is between fetch and its final report.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Fetching | Self::Parsing | Self::Persisting)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Parsing => write!(f, "Parsing"),
            Self::Persisting => write!(f, "Persisting"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}
