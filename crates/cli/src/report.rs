//! Console output for conversion results.

use segmenter_core::{BatchResult, ConversionOutcome, ConversionResult};

/// One line per converted (or failed) file.
pub fn result_line(name: &str, result: &ConversionResult) -> String {
    match &result.outcome {
        ConversionOutcome::Converted {
            output_dir,
            segments,
        } => format!(
            "✓ {} -> {} ({} {})",
            name,
            output_dir.display(),
            segments.len(),
            if segments.len() == 1 { "segment" } else { "segments" }
        ),
        ConversionOutcome::Failed { message, .. } => format!("✗ {}: {}", name, message),
    }
}

pub fn summary_line(converted: usize, failed: usize) -> String {
    format!("Summary: {} converted, {} failed", converted, failed)
}

/// Prints every result followed by the summary, returning the process exit code.
pub fn print_batch(batch: &BatchResult) -> u8 {
    for (name, result) in batch {
        println!("{}", result_line(name, result));
    }
    println!(
        "{}",
        summary_line(batch.success_count(), batch.failure_count())
    );
    exit_code(batch.failure_count())
}

/// 0 when everything converted, 1 on any failure.
pub fn exit_code(failed: usize) -> u8 {
    if failed == 0 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmenter_core::ConverterError;
    use std::path::PathBuf;

    #[test]
    fn test_result_line_converted() {
        let result = ConversionResult::converted(
            PathBuf::from("/books/a.m4a"),
            PathBuf::from("/books/a_segments"),
            vec![
                PathBuf::from("/books/a_segments/segment_000.mp3"),
                PathBuf::from("/books/a_segments/segment_001.mp3"),
            ],
        );
        assert_eq!(
            result_line("a.m4a", &result),
            "✓ a.m4a -> /books/a_segments (2 segments)"
        );
    }

    #[test]
    fn test_result_line_single_segment() {
        let result = ConversionResult::converted(
            PathBuf::from("short.m4a"),
            PathBuf::from("short_segments"),
            vec![PathBuf::from("short_segments/segment_000.mp3")],
        );
        assert!(result_line("short.m4a", &result).ends_with("(1 segment)"));
    }

    #[test]
    fn test_result_line_failed() {
        let err = ConverterError::transcode_failed(Some(1), "moov atom not found");
        let result = ConversionResult::failed(PathBuf::from("bad.m4a"), &err);
        let line = result_line("bad.m4a", &result);
        assert!(line.starts_with("✗ bad.m4a: "));
        assert!(line.contains("moov atom not found"));
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(2, 1), "Summary: 2 converted, 1 failed");
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(0), 0);
        assert_eq!(exit_code(3), 1);
    }
}
