//! Per-stage state captured during the forward pass.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{SmoothingKind, Stage};

/// What a stage's inverse needs, captured before the stage ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageContext {
    /// Recorded for reporting; never inverted.
    Drop {
        start: NaiveDate,
        end: NaiveDate,
        removed: usize,
    },
    /// The calendar itself lives on the pipeline.
    CalendarWeight,
    Smooth {
        kind: SmoothingKind,
        window: usize,
        /// Last `window - 1` values entering the smoother.
        trailing: Vec<Option<f64>>,
        /// Last smoothed value.
        last_smoothed: Option<f64>,
    },
    Log,
    Diff1 {
        last: Option<f64>,
    },
    Diff7 {
        history: Vec<Option<f64>>,
    },
}

impl StageContext {
    pub fn stage(&self) -> Stage {
        match self {
            StageContext::Drop { .. } => Stage::Drop,
            StageContext::CalendarWeight => Stage::CalendarWeight,
            StageContext::Smooth { .. } => Stage::Smooth,
            StageContext::Log => Stage::Log,
            StageContext::Diff1 { .. } => Stage::Diff1,
            StageContext::Diff7 { .. } => Stage::Diff7,
        }
    }
}

/// All contexts of one forward pass, keyed by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageContexts {
    /// Last real date of the sample after the drop stage; forecasts start the
    /// day after.
    pub origin: NaiveDate,
    contexts: BTreeMap<Stage, StageContext>,
}

impl StageContexts {
    pub fn new(origin: NaiveDate) -> Self {
        Self {
            origin,
            contexts: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, context: StageContext) {
        self.contexts.insert(context.stage(), context);
    }

    pub fn get(&self, stage: Stage) -> Option<&StageContext> {
        self.contexts.get(&stage)
    }

    /// Stages with a recorded context, in pipeline order.
    pub fn stages(&self) -> Vec<Stage> {
        self.contexts.keys().copied().collect()
    }

    /// Recorded stages that have an inverse, in pipeline order.
    pub fn invertible_stages(&self) -> Vec<Stage> {
        self.contexts
            .keys()
            .copied()
            .filter(|s| s.is_invertible())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_come_back_in_pipeline_order() {
        let origin = NaiveDate::from_ymd_opt(2018, 3, 31).unwrap();
        let mut ctx = StageContexts::new(origin);
        ctx.insert(StageContext::Diff7 { history: vec![] });
        ctx.insert(StageContext::Log);
        ctx.insert(StageContext::Drop {
            start: origin,
            end: origin,
            removed: 0,
        });
        assert_eq!(ctx.stages(), vec![Stage::Drop, Stage::Log, Stage::Diff7]);
        assert_eq!(ctx.invertible_stages(), vec![Stage::Log, Stage::Diff7]);
    }
}
