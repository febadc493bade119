use clap::Parser;

use crate::zip::{ParseOptions, TraversalMode};

#[derive(Parser, Debug)]
#[command(name = "zipexplore")]
#[command(version)]
#[command(about = "Display the structure and metadata of ZIP files", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipexplore -s data1.zip            dump local headers, central directory and end record\n  \
  zipexplore -p foo.zip '*.txt'      print decoded contents of text entries\n  \
  zipexplore -v https://example.com/archive.zip   list a remote ZIP verbosely")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to show (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes, ratio and timestamps
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Dump every structural record
    #[arg(short = 's', long = "structure")]
    pub structure: bool,

    /// Write decoded contents to stdout
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Scan local headers front to back instead of following the central directory
    #[arg(long)]
    pub sequential: bool,

    /// Reject data after the end of central directory record
    #[arg(long)]
    pub strict: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Log parser diagnostics to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Parser configuration selected by the flags.
    pub fn parse_options(&self) -> ParseOptions {
        let mode = if self.sequential {
            TraversalMode::Sequential
        } else {
            TraversalMode::CentralDirectory
        };
        ParseOptions::new().with_mode(mode).with_strict(self.strict)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.is_very_quiet() {
            "error"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::parse_from(["zipexplore", "--sequential", "--strict", "a.zip"]);
        let options = cli.parse_options();
        assert_eq!(options.mode, TraversalMode::Sequential);
        assert!(options.strict);
        assert!(!cli.is_http_url());

        let cli = Cli::parse_from(["zipexplore", "-qq", "https://host/a.zip", "x.txt"]);
        assert_eq!(cli.parse_options(), ParseOptions::default());
        assert!(cli.is_http_url());
        assert_eq!(cli.log_filter(), "error");
        assert_eq!(cli.files, vec!["x.txt".to_string()]);
    }
}
