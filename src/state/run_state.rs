/// Run state definitions for tracking scrape progress
///
/// A run moves `Idle -> ResolvingIndex -> ExtractingArticles -> Done`.
/// `Failed` is only reachable while resolving the index.
use std::fmt;

/// Represents the current state of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Run has been created but not started
    Idle,

    /// Paginating the author's listing
    ResolvingIndex,

    /// Extracting articles (and comments) from the resolved index
    ExtractingArticles,

    // ===== Terminal States =====
    /// Run finished, possibly with partial data
    Done,

    /// Author index could not be resolved and nothing was found
    Failed,
}

impl RunState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the run is in progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ResolvingIndex | Self::ExtractingArticles)
    }

    /// Returns true if the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::ResolvingIndex)
                | (Self::ResolvingIndex, Self::ExtractingArticles)
                | (Self::ResolvingIndex, Self::Failed)
                | (Self::ExtractingArticles, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingIndex => "resolving_index",
            Self::ExtractingArticles => "extracting_articles",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible run states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::ResolvingIndex,
            Self::ExtractingArticles,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
