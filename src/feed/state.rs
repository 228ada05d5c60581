//! Committed overlay states

/// Resting state of the feed overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Closed,
    Open,
}

impl FeedState {
    /// Progress value at rest in this state
    pub fn progress(self) -> f32 {
        match self {
            FeedState::Closed => 0.0,
            FeedState::Open => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            FeedState::Closed => FeedState::Open,
            FeedState::Open => FeedState::Closed,
        }
    }

    /// State reached by dragging away from `self`. Closed -> Open is the
    /// positive direction; with no state that way, returns `self`.
    pub fn target(self, toward_positive: bool) -> Self {
        match (self, toward_positive) {
            (FeedState::Closed, true) => FeedState::Open,
            (FeedState::Open, false) => FeedState::Closed,
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_follows_direction() {
        assert_eq!(FeedState::Closed.target(true), FeedState::Open);
        assert_eq!(FeedState::Closed.target(false), FeedState::Closed);
        assert_eq!(FeedState::Open.target(false), FeedState::Closed);
        assert_eq!(FeedState::Open.target(true), FeedState::Open);
    }
}
