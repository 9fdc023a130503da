//! Decoding options.
//!
//! Callers fill in a [`DecodingParams`], every field defaulted, and each
//! dispatch validates it into a [`RequestOptions`] before any work is queued.

use serde::{Deserialize, Serialize};
use crate::error::{Result, TranslateError};

pub const DEFAULT_BEAM_SIZE: usize = 4;
pub const DEFAULT_NUM_HYPOTHESES: usize = 1;
pub const DEFAULT_LENGTH_PENALTY: f32 = 0.6;
pub const DEFAULT_MAX_DECODING_LENGTH: usize = 250;
pub const DEFAULT_MIN_DECODING_LENGTH: usize = 1;

/// # DecodingParams
///
/// Caller-supplied decoding fields, each defaulted when omitted.
///
/// This is the raw, unvalidated shape callers build (or deserialize) before
/// a dispatch. It becomes a [`RequestOptions`] through [`RequestOptions::new`],
/// which is where consistency checks happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingParams {
    /// Number of partial sequences tracked during decoding
    pub beam_size: usize,

    /// Number of hypotheses returned per source item
    pub num_hypotheses: usize,

    /// Length penalty applied by the engine when ranking hypotheses
    pub length_penalty: f32,

    /// Upper bound on generated tokens
    pub max_decoding_length: usize,

    /// Lower bound on generated tokens
    pub min_decoding_length: usize,

    /// Restrict the decoder to the vocabulary-mapping variant
    pub restrict_vocabulary: bool,

    /// Request per-hypothesis attention matrices (batch mode only)
    pub return_attention: bool,

    /// Interleave scores with output lines (file mode only)
    pub with_scores: bool,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            beam_size: DEFAULT_BEAM_SIZE,
            num_hypotheses: DEFAULT_NUM_HYPOTHESES,
            length_penalty: DEFAULT_LENGTH_PENALTY,
            max_decoding_length: DEFAULT_MAX_DECODING_LENGTH,
            min_decoding_length: DEFAULT_MIN_DECODING_LENGTH,
            restrict_vocabulary: false,
            return_attention: false,
            with_scores: false,
        }
    }
}

/// # RequestOptions
///
/// Validated decoding configuration shared by both dispatch paths.
///
/// A `RequestOptions` is a pure value: it is built once per call, never
/// mutated afterwards and never shared across concurrent calls. Construction
/// performs no engine interaction, so a rejected configuration never leaves
/// work half-submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    params: DecodingParams,
}

impl RequestOptions {
    /// Validates `params` into an immutable option value.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::InvalidOptions`] when the beam width or the
    /// hypothesis count is zero, when the minimum decoding length exceeds the
    /// maximum, or when the length penalty is not a finite number.
    pub fn new(params: DecodingParams) -> Result<Self> {
        if params.beam_size == 0 {
            return Err(TranslateError::invalid("beam_size must be positive"));
        }
        if params.num_hypotheses == 0 {
            return Err(TranslateError::invalid("num_hypotheses must be positive"));
        }
        if params.min_decoding_length > params.max_decoding_length {
            return Err(TranslateError::invalid(format!(
                "min_decoding_length ({}) exceeds max_decoding_length ({})",
                params.min_decoding_length, params.max_decoding_length
            )));
        }
        if !params.length_penalty.is_finite() {
            return Err(TranslateError::invalid("length_penalty must be finite"));
        }
        Ok(Self { params })
    }

    pub fn beam_size(&self) -> usize {
        self.params.beam_size
    }

    pub fn num_hypotheses(&self) -> usize {
        self.params.num_hypotheses
    }

    pub fn length_penalty(&self) -> f32 {
        self.params.length_penalty
    }

    pub fn max_decoding_length(&self) -> usize {
        self.params.max_decoding_length
    }

    pub fn min_decoding_length(&self) -> usize {
        self.params.min_decoding_length
    }

    pub fn restrict_vocabulary(&self) -> bool {
        self.params.restrict_vocabulary
    }

    pub fn return_attention(&self) -> bool {
        self.params.return_attention
    }

    pub fn with_scores(&self) -> bool {
        self.params.with_scores
    }

    /// The raw parameters this value was validated from.
    pub fn params(&self) -> &DecodingParams {
        &self.params
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            params: DecodingParams::default(),
        }
    }
}

impl TryFrom<DecodingParams> for RequestOptions {
    type Error = TranslateError;

    fn try_from(params: DecodingParams) -> Result<Self> {
        Self::new(params)
    }
}
