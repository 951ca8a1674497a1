/// Pipeline stage an error originated from.
///
/// The scheduler uses this to label failed ticks. Both stages end the tick
/// without touching either store.
///
/// | Stage | Errors |
/// |-------|--------|
/// | `Fetch` | `Provider`, `Auth`, `Timeout`, `Network` |
/// | `Parse` | `MalformedPayload`, `SchemaMismatch` |
/// | `Config` | `InvalidSymbolSet` |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailureStage {
    /// The outbound provider call failed or timed out.
    Fetch,

    /// The payload arrived but could not be decoded.
    Parse,

    /// The request itself was invalid before anything was sent.
    Config,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Parse => write!(f, "parse"),
            Self::Config => write!(f, "config"),
        }
    }
}
