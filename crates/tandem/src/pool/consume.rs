//! Streaming translation of a tokenized text file through the pool.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;
use crate::error::{Result, TranslateError};
use crate::options::RequestOptions;
use super::item::TranslationFuture;
use super::translator_pool::TranslatorPool;

impl TranslatorPool {
    /// Translates `input` line by line into `output`.
    ///
    /// Each input line is split on whitespace into tokens. Lines are grouped
    /// into chunks of at most `max_batch_size`, chunks are spread across the
    /// workers, and results are written back strictly in input order: one line
    /// per hypothesis, prefixed with `"{score} ||| "` when `with_scores` is set.
    ///
    /// Blocks the calling thread until the whole file is written. Returns the
    /// number of source lines translated.
    ///
    /// # Errors
    ///
    /// * [`TranslateError::InvalidOptions`] if `max_batch_size` is zero
    /// * [`TranslateError::Io`] if `input` cannot be read or `output` cannot be
    ///   written; a missing input creates no output file
    /// * [`TranslateError::Engine`] if a chunk fails to translate
    ///
    /// Output already written before a failure is left on disk.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context; run
    /// it on a blocking thread instead.
    pub fn consume_text_file(
        &self,
        input: &Path,
        output: &Path,
        max_batch_size: usize,
        options: &RequestOptions,
        with_scores: bool,
    ) -> Result<usize> {
        if max_batch_size == 0 {
            return Err(TranslateError::invalid("max_batch_size must be positive"));
        }

        let reader = BufReader::new(File::open(input).map_err(|e| TranslateError::io(input, e))?);
        let mut writer = ChunkWriter {
            inner: BufWriter::new(File::create(output).map_err(|e| TranslateError::io(output, e))?),
            path: output,
            with_scores,
        };

        let max_in_flight = 2 * self.pool_size();
        let mut pending: VecDeque<TranslationFuture> = VecDeque::with_capacity(max_in_flight);
        let mut chunk: Vec<Vec<String>> = Vec::with_capacity(max_batch_size);
        let mut translated = 0;

        for line in reader.lines() {
            let line = line.map_err(|e| TranslateError::io(input, e))?;
            chunk.push(line.split_whitespace().map(str::to_string).collect());
            if chunk.len() < max_batch_size {
                continue;
            }
            let full = std::mem::replace(&mut chunk, Vec::with_capacity(max_batch_size));
            pending.push_back(self.post(full, options.clone()));
            if pending.len() >= max_in_flight {
                translated += writer.write_next(&mut pending)?;
            }
        }
        if !chunk.is_empty() {
            pending.push_back(self.post(chunk, options.clone()));
        }
        while !pending.is_empty() {
            translated += writer.write_next(&mut pending)?;
        }
        writer.flush()?;

        info!(
            input = %input.display(),
            output = %output.display(),
            lines = translated,
            "file translated"
        );
        Ok(translated)
    }
}

struct ChunkWriter<'a> {
    inner: BufWriter<File>,
    path: &'a Path,
    with_scores: bool,
}

impl ChunkWriter<'_> {
    /// Waits for the oldest pending chunk and writes it out.
    fn write_next(&mut self, pending: &mut VecDeque<TranslationFuture>) -> Result<usize> {
        let Some(future) = pending.pop_front() else {
            return Ok(0);
        };
        let outputs = future.wait()?;
        for output in &outputs {
            for (tokens, score) in output.hypotheses().iter().zip(output.scores()) {
                let line = tokens.join(" ");
                let written = if self.with_scores {
                    writeln!(self.inner, "{score} ||| {line}")
                } else {
                    writeln!(self.inner, "{line}")
                };
                written.map_err(|e| TranslateError::io(self.path, e))?;
            }
        }
        Ok(outputs.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| TranslateError::io(self.path, e))
    }
}
