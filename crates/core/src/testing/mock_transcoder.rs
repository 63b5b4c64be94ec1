//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::converter::{
    segment_file_name, ConversionRequest, ConverterError, TranscodeOutput, Transcoder,
};

/// A scripted failure for one input file.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    status_code: i32,
    stderr: String,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track requests for assertions
/// - Write fake segment files into the output directory
/// - Fail specific inputs with a chosen exit code and stderr
/// - Simulate a transcoder that is not installed
///
/// # Example
///
/// ```rust,ignore
/// use segmenter_core::testing::MockTranscoder;
///
/// let mock = Arc::new(
///     MockTranscoder::new()
///         .with_segment_count(3)
///         .fail_on("corrupt.m4a", 1, "moov atom not found"),
/// );
/// let converter = SegmentConverter::new(mock.clone(), 300);
///
/// let result = converter.convert_file(Path::new("/books/book.m4a")).await;
/// assert_eq!(mock.call_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded requests, in call order.
    requests: Mutex<Vec<ConversionRequest>>,
    /// Segments written per successful call.
    segment_count: usize,
    /// Failures keyed by input file name.
    failures: HashMap<String, ScriptedFailure>,
    /// Simulate a missing binary.
    missing: bool,
    /// Simulated transcoding time.
    delay: Option<Duration>,
    /// Calls currently in progress.
    in_flight: AtomicUsize,
    /// Highest number of simultaneous calls observed.
    max_in_flight: AtomicUsize,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a mock that succeeds with one segment per file.
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            segment_count: 1,
            failures: HashMap::new(),
            missing: false,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Number of fake segments written per call.
    pub fn with_segment_count(mut self, count: usize) -> Self {
        self.segment_count = count;
        self
    }

    /// Make the input with this file name exit with `status_code`.
    ///
    /// Partial segments are still written first, like an encoder dying midway.
    pub fn fail_on(mut self, file_name: &str, status_code: i32, stderr: &str) -> Self {
        self.failures.insert(
            file_name.to_string(),
            ScriptedFailure {
                status_code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Behave as if the transcoder binary is not installed.
    pub fn tool_missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all recorded requests.
    pub fn recorded_requests(&self) -> Vec<ConversionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Get the number of transcode calls.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Highest number of overlapping calls seen so far.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn missing_error() -> ConverterError {
        ConverterError::ExternalToolMissing {
            path: PathBuf::from("mock-ffmpeg"),
        }
    }

    async fn run(&self, request: &ConversionRequest) -> Result<TranscodeOutput, ConverterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        for index in 0..self.segment_count {
            let path = request.output_dir.join(segment_file_name(index));
            tokio::fs::write(&path, format!("fake mp3 segment {}", index)).await?;
        }

        let file_name = request
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.failures.get(&file_name) {
            Some(failure) => Ok(TranscodeOutput {
                status_code: Some(failure.status_code),
                stderr: failure.stderr.clone(),
            }),
            None => Ok(TranscodeOutput {
                status_code: Some(0),
                stderr: String::new(),
            }),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        request: &ConversionRequest,
    ) -> Result<TranscodeOutput, ConverterError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.missing {
            return Err(Self::missing_error());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = self.run(request).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if self.missing {
            return Err(Self::missing_error());
        }
        Ok(())
    }
}
