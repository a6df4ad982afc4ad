//! Per-query pipeline states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro-level state of one query.
///
/// The order is fixed: context before answers, all answers before any
/// classification, all classifications before any span localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    ContextPending,
    ContextReady,
    AnswersPending,
    AnswersReady,
    ClassifyPending,
    ClassifyReady,
    SpansPending,
    Done,
}

impl PipelineStage {
    /// Every stage, in execution order.
    pub const ALL: [PipelineStage; 8] = [
        Self::ContextPending,
        Self::ContextReady,
        Self::AnswersPending,
        Self::AnswersReady,
        Self::ClassifyPending,
        Self::ClassifyReady,
        Self::SpansPending,
        Self::Done,
    ];

    /// The stage that follows this one; `None` for `Done`.
    pub fn next(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextPending => "context_pending",
            Self::ContextReady => "context_ready",
            Self::AnswersPending => "answers_pending",
            Self::AnswersReady => "answers_ready",
            Self::ClassifyPending => "classify_pending",
            Self::ClassifyReady => "classify_ready",
            Self::SpansPending => "spans_pending",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the stages a query has passed through.
#[derive(Debug, Clone, Default)]
pub(crate) struct StageTrace {
    stages: Vec<PipelineStage>,
}

impl StageTrace {
    /// Enter the next stage.
    pub fn enter(&mut self, stage: PipelineStage) {
        debug_assert_eq!(
            self.stages.last().and_then(|s| s.next()).unwrap_or(PipelineStage::ContextPending),
            stage,
            "pipeline stages must advance in order"
        );
        tracing::debug!(stage = %stage, "Pipeline stage");
        self.stages.push(stage);
    }

    pub fn into_stages(self) -> Vec<PipelineStage> {
        self.stages
    }
}
