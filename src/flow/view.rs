//! User-visible projection of a resolution attempt.

use crate::error::LinkResult;

/// What a viewer shows while and after a flow runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<M> {
    Loading,
    Ready(M),
    /// Human-readable failure, including the underlying cause.
    Failed(String),
}

impl<M> ViewState<M> {
    pub fn from_result(result: LinkResult<M>) -> Self {
        match result {
            Ok(model) => ViewState::Ready(model),
            Err(e) => ViewState::Failed(e.user_message()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

impl<M> Default for ViewState<M> {
    fn default() -> Self {
        ViewState::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;

    #[test]
    fn test_from_result() {
        assert!(ViewState::<u32>::default().is_loading());
        assert_eq!(ViewState::from_result(Ok(7)), ViewState::Ready(7));

        let failed = ViewState::<u32>::from_result(Err(LinkError::ResourceNotFound("Q1".into())));
        match failed {
            ViewState::Failed(message) => {
                assert!(message.starts_with("Unable to open table"));
                assert!(message.contains("Q1"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }
}
