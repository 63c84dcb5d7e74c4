//! Stage-output accumulator for one pipeline run.

use std::collections::BTreeMap;

use super::StageName;

/// Named outputs of completed stages, available read-only to dependent
/// stages. Grows monotonically within one run and is discarded at run end.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    outputs: BTreeMap<StageName, String>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, stage: StageName) -> bool {
        self.outputs.contains_key(&stage)
    }

    /// Records a completed stage's output. The scheduler runs each stage at
    /// most once; inserting twice is a scheduler bug.
    pub fn insert(&mut self, stage: StageName, output: String) {
        let previous = self.outputs.insert(stage, output);
        debug_assert!(previous.is_none(), "stage '{stage}' ran twice");
    }

    pub fn get(&self, stage: StageName) -> Option<&str> {
        self.outputs.get(&stage).map(String::as_str)
    }

    /// Fetches a dependency's output. Only called for stages the scheduler
    /// has already proven complete.
    pub fn require(&self, stage: StageName) -> &str {
        self.get(stage)
            .expect("dependency output missing: scheduler runs dependencies first")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_monotonically_and_serves_reads() {
        let mut ctx = AnalysisContext::new();
        assert!(!ctx.contains(StageName::CvAnalysis));

        ctx.insert(StageName::CvAnalysis, "analysis".to_string());
        assert!(ctx.contains(StageName::CvAnalysis));
        assert_eq!(ctx.get(StageName::CvAnalysis), Some("analysis"));
        assert_eq!(ctx.require(StageName::CvAnalysis), "analysis");

        ctx.insert(StageName::Verification, "cross-check".to_string());
        assert!(ctx.contains(StageName::Verification));
        assert_eq!(ctx.get(StageName::CvAnalysis), Some("analysis"));
    }

    #[test]
    fn missing_stage_reads_as_none() {
        let ctx = AnalysisContext::new();
        assert_eq!(ctx.get(StageName::FinalDecision), None);
    }
}
