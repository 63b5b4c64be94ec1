use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "convert",
    version,
    about = "Split M4A audiobooks into fixed-length MP3 segments",
    long_about = "Converts a single .m4a file, or every .m4a file in a directory, into \
numbered MP3 segments written to '<name>_segments' next to each input. Requires ffmpeg."
)]
pub struct Args {
    /// An .m4a file or a directory containing .m4a files
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Length of each segment in seconds [default: 300]
    #[arg(
        short = 't',
        long,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub segment_time: Option<u32>,

    /// Also convert files in subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of files converted at the same time
    #[arg(
        short,
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub jobs: Option<u32>,

    /// Kill ffmpeg if one file takes longer than this
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// ffmpeg binary to use
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "SEGMENTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Default log filter when RUST_LOG is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("convert").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_minimal() {
        let args = parse(&["book.m4a"]).unwrap();
        assert_eq!(args.path, PathBuf::from("book.m4a"));
        assert_eq!(args.segment_time, None);
        assert!(!args.recursive);
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn test_parse_all_flags() {
        let args = parse(&[
            "books",
            "--segment-time",
            "180",
            "--recursive",
            "--jobs",
            "4",
            "--timeout",
            "600",
            "--ffmpeg",
            "/opt/ffmpeg",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.segment_time, Some(180));
        assert!(args.recursive);
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.timeout, Some(600));
        assert_eq!(args.ffmpeg, Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_zero_segment_time_rejected() {
        let err = parse(&["book.m4a", "--segment-time", "0"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_non_numeric_segment_time_rejected() {
        assert!(parse(&["book.m4a", "--segment-time", "five"]).is_err());
        assert!(parse(&["book.m4a", "--segment-time", "-5"]).is_err());
    }

    #[test]
    fn test_path_required() {
        assert!(parse(&[]).is_err());
    }
}
