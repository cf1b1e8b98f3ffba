//! Merge authoritative data with active predictions for display.

/// Value shown to the player: the newest prediction if one is active, else the
/// authoritative value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState<S> {
    /// Displayed value; `None` when nothing was ever loaded.
    pub value: Option<S>,
    /// `true` while the value comes from an unconfirmed prediction.
    pub optimistic: bool,
}

impl<S> DisplayState<S> {
    /// Merge an authoritative value with an optional prediction.
    pub fn merge(authoritative: Option<S>, overlay: Option<S>) -> Self {
        match overlay {
            Some(predicted) => Self {
                value: Some(predicted),
                optimistic: true,
            },
            None => Self {
                value: authoritative,
                optimistic: false,
            },
        }
    }

    /// Project the displayed value with `rules`, carrying the pending modifier.
    pub fn project<T>(&self, rules: impl FnOnce(Option<&S>) -> T) -> Projection<T> {
        Projection {
            status: rules(self.value.as_ref()),
            pending: self.optimistic,
        }
    }
}

/// Status derived from a [`DisplayState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection<T> {
    /// Projected status.
    pub status: T,
    /// The status reflects a prediction the server has not confirmed yet.
    pub pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::quest::{QuestLog, QuestLogKey, QuestStatus, project_status};

    #[test]
    fn without_overlay_display_equals_authoritative() {
        let display = DisplayState::merge(Some(4), None);
        assert_eq!(display.value, Some(4));
        assert!(!display.optimistic);
    }

    #[test]
    fn overlay_takes_precedence() {
        let display = DisplayState::merge(Some(4), Some(5));
        assert_eq!(display.value, Some(5));
        assert!(display.optimistic);
    }

    #[test]
    fn projection_marks_prediction_as_pending() {
        let key = QuestLogKey::new("0xabc", "q1");
        let predicted = QuestLog {
            completed: true,
            repeat_count: 1,
            ..QuestLog::placeholder(&key)
        };

        let projection = DisplayState::merge(None, Some(predicted)).project(project_status);
        assert_eq!(projection.status, QuestStatus::Completed);
        assert!(projection.pending);
    }

    #[test]
    fn projection_is_stable_without_overlay() {
        let display: DisplayState<QuestLog> = DisplayState::merge(None, None);
        assert_eq!(
            display.project(project_status),
            display.project(project_status)
        );
    }
}
