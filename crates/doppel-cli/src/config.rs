//! CLI configuration

use crate::commands::{Cli, LogFormatArg};
use crate::error::{CliError, CliResult};
use std::path::PathBuf;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - warnings and errors
    #[default]
    Normal,
    /// Verbose - progress messages
    Verbose,
    /// Debug - generator internals
    Debug,
    /// Trace - every interception decision
    Trace,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// Log event format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact text lines
    #[default]
    Text,
    /// JSON objects
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Where type declarations come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Scan `.rs` files under a directory
    Sources(PathBuf),
    /// Load a JSON or YAML catalog file
    File(PathBuf),
}

/// Where the generated source goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Print to stdout
    Stdout,
    /// Write `<type>_mock.rs` into a directory
    Dir(PathBuf),
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Type to generate a double for
    pub type_name: String,
    /// Declaration source
    pub source: CatalogSource,
    /// Artifact destination
    pub output: Output,
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Log event format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Create a configuration that scans the current directory and writes into it.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            source: CatalogSource::Sources(PathBuf::from(".")),
            output: Output::Dir(PathBuf::from(".")),
            verbosity: Verbosity::Normal,
            log_format: LogFormat::Text,
        }
    }

    /// Build a configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Fails when no type name was given.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let type_name = cli
            .type_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CliError::invalid_argument("bad type: no type provided"))?;

        let source = cli.catalog.as_ref().map_or_else(
            || CatalogSource::Sources(cli.dir.clone()),
            |file| CatalogSource::File(file.clone()),
        );
        let output = if cli.stdout {
            Output::Stdout
        } else {
            Output::Dir(cli.out_dir.clone())
        };

        Ok(Self::new(type_name)
            .with_source(source)
            .with_output(output)
            .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
            .with_log_format(cli.log_format.into()))
    }

    /// Set the declaration source
    #[must_use]
    pub fn with_source(mut self, source: CatalogSource) -> Self {
        self.source = source;
        self
    }

    /// Set the artifact destination
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliResult<CliConfig> {
        let cli = Cli::try_parse_from(std::iter::once("doppel").chain(args.iter().copied()))
            .unwrap();
        CliConfig::from_cli(&cli)
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, 0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, 7), Verbosity::Trace);
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(Verbosity::Quiet.filter_directive(), "error");
        assert_eq!(Verbosity::Normal.filter_directive(), "warn");
        assert_eq!(Verbosity::Verbose.filter_directive(), "info");
        assert_eq!(Verbosity::Debug.filter_directive(), "debug");
        assert!(Verbosity::Quiet.is_quiet());
        assert!(!Verbosity::Trace.is_quiet());
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.to_string(), "bad type: no type provided");
        assert!(parse(&[""]).is_err());
    }

    #[test]
    fn test_scan_source_by_default() {
        let config = parse(&["-C", "crates/app", "Engine"]).unwrap();
        assert_eq!(config.type_name, "Engine");
        assert_eq!(config.source, CatalogSource::Sources(PathBuf::from("crates/app")));
        assert!(matches!(config.output, Output::Dir(_)));
    }

    #[test]
    fn test_catalog_file_and_stdout() {
        let config = parse(&["--catalog", "types.json", "--stdout", "-q", "Engine"]).unwrap();
        assert_eq!(config.source, CatalogSource::File(PathBuf::from("types.json")));
        assert_eq!(config.output, Output::Stdout);
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_builder() {
        let config = CliConfig::new("Engine")
            .with_output(Output::Stdout)
            .with_log_format(LogFormat::Json);
        assert_eq!(config.output, Output::Stdout);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.verbosity, Verbosity::default());
    }
}
