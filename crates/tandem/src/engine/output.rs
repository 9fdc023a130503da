use crate::error::EngineError;

/// # EngineOutput
///
/// The engine's native result object for one source item.
///
/// Holds every hypothesis the engine produced, ordered from most to least
/// preferred, together with one score per hypothesis and, when the engine
/// computed them, one attention matrix per hypothesis. Attention is a single
/// per-result flag: either every hypothesis carries a matrix or none does.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineOutput {
    hypotheses: Vec<Vec<String>>,
    scores: Vec<f32>,
    attention: Option<Vec<Vec<Vec<f32>>>>,
}

impl EngineOutput {
    /// Creates a result without attention.
    ///
    /// `hypotheses` and `scores` are index-aligned and must have equal length.
    pub fn new(hypotheses: Vec<Vec<String>>, scores: Vec<f32>) -> Self {
        debug_assert_eq!(hypotheses.len(), scores.len(), "one score per hypothesis");
        Self {
            hypotheses,
            scores,
            attention: None,
        }
    }

    /// Attaches one attention matrix per hypothesis.
    pub fn with_attention(mut self, attention: Vec<Vec<Vec<f32>>>) -> Self {
        debug_assert_eq!(self.hypotheses.len(), attention.len(), "one matrix per hypothesis");
        self.attention = Some(attention);
        self
    }

    pub fn num_hypotheses(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn hypotheses(&self) -> &[Vec<String>] {
        &self.hypotheses
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn has_attention(&self) -> bool {
        self.attention.is_some()
    }

    /// Attention matrices, empty when [`has_attention`](Self::has_attention) is false.
    pub fn attention(&self) -> &[Vec<Vec<f32>>] {
        self.attention.as_deref().unwrap_or(&[])
    }

    /// Checks the result against the engine contract.
    ///
    /// # Parameters
    ///
    /// * `max_hypotheses` - The hypothesis count the caller requested
    ///
    /// # Returns
    ///
    /// An [`EngineError`] when there are more hypotheses than requested, or
    /// when scores or attention matrices do not line up one per hypothesis.
    pub fn validate(&self, max_hypotheses: usize) -> Result<(), EngineError> {
        let count = self.num_hypotheses();
        if count > max_hypotheses {
            return Err(EngineError::new(format!(
                "engine returned {count} hypotheses, at most {max_hypotheses} requested"
            )));
        }
        if self.scores.len() != count {
            return Err(EngineError::new(format!(
                "engine returned {} scores for {count} hypotheses",
                self.scores.len()
            )));
        }
        if let Some(attention) = &self.attention {
            if attention.len() != count {
                return Err(EngineError::new(format!(
                    "engine returned {} attention matrices for {count} hypotheses",
                    attention.len()
                )));
            }
        }
        Ok(())
    }
}
