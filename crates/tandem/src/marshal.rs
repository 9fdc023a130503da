//! Caller-visible result records and their construction from engine output.

use std::ops::Index;
use serde::{Deserialize, Serialize};
use crate::engine::EngineOutput;

/// One candidate output sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Engine-defined score, larger is more probable
    pub score: f32,
    pub tokens: Vec<String>,
    /// One row per output token, one weight per source token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention: Option<Vec<Vec<f32>>>,
}

/// Hypotheses for one source item, most preferred first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationResult {
    pub hypotheses: Vec<Hypothesis>,
}

impl TranslationResult {
    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    /// The most preferred hypothesis, if the engine returned any.
    pub fn best(&self) -> Option<&Hypothesis> {
        self.hypotheses.first()
    }

    pub fn has_attention(&self) -> bool {
        self.hypotheses.first().is_some_and(|h| h.attention.is_some())
    }
}

/// # BatchResult
///
/// One [`TranslationResult`] per request item; `result[i]` answers `request[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult {
    results: Vec<TranslationResult>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranslationResult> {
        self.results.iter()
    }

    pub fn get(&self, index: usize) -> Option<&TranslationResult> {
        self.results.get(index)
    }

    pub fn into_inner(self) -> Vec<TranslationResult> {
        self.results
    }
}

impl From<Vec<TranslationResult>> for BatchResult {
    fn from(results: Vec<TranslationResult>) -> Self {
        Self { results }
    }
}

impl Index<usize> for BatchResult {
    type Output = TranslationResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl IntoIterator for BatchResult {
    type Item = TranslationResult;
    type IntoIter = std::vec::IntoIter<TranslationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a TranslationResult;
    type IntoIter = std::slice::Iter<'a, TranslationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Converts engine results into caller-visible records.
///
/// Reads, for every hypothesis index below `num_hypotheses()`, the score and
/// the output tokens, and copies the attention matrix row by row only when the
/// engine flagged the result as carrying attention. An engine result whose
/// parts disagree in length breaks the engine contract and panics.
pub struct ResultMarshaller;

impl ResultMarshaller {
    pub fn marshal(output: &EngineOutput) -> TranslationResult {
        let count = output.num_hypotheses();
        assert!(
            output.scores().len() >= count,
            "engine returned {} scores for {count} hypotheses",
            output.scores().len()
        );
        if output.has_attention() {
            assert!(
                output.attention().len() >= count,
                "engine returned {} attention matrices for {count} hypotheses",
                output.attention().len()
            );
        }

        let hypotheses = (0..count)
            .map(|i| Hypothesis {
                score: output.scores()[i],
                tokens: output.hypotheses()[i].clone(),
                attention: output
                    .has_attention()
                    .then(|| output.attention()[i].iter().map(|row| row.to_vec()).collect()),
            })
            .collect();
        TranslationResult { hypotheses }
    }

    pub fn marshal_batch(outputs: &[EngineOutput]) -> BatchResult {
        outputs.iter().map(Self::marshal).collect::<Vec<_>>().into()
    }
}
