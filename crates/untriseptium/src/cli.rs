use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use untriseptium_matcher::LocationHint;
use untriseptium_types::Rgb;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EngineKind {
    Tesseract,
    Noop,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Tesseract => "tesseract",
            EngineKind::Noop => "noop",
        }
    }
}

#[derive(Debug, Default)]
pub struct CliSources {
    pub preset_from_cli: bool,
    pub engine_from_cli: bool,
    pub threshold_from_cli: bool,
    pub unconfidence_ratio_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            preset_from_cli: value_from_cli(matches, "preset"),
            engine_from_cli: value_from_cli(matches, "engine"),
            threshold_from_cli: value_from_cli(matches, "confidence_threshold"),
            unconfidence_ratio_from_cli: value_from_cli(matches, "ocr_unconfidence_ratio"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

/// Parse an explicit argument list, reporting errors instead of exiting.
pub fn try_parse_cli_from<I, T>(args: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(args)?;
    let args = CliArgs::from_arg_matches(&matches)?;
    let sources = CliSources::from_matches(&matches);
    Ok((args, sources))
}

#[derive(Debug, Parser)]
#[command(
    name = "untriseptium",
    about = "Locate text in a screenshot through fuzzy matching of OCR output",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Screenshot to search
    pub image: PathBuf,

    /// Text to locate
    pub text: String,

    /// Language and strategy preset (default, en, words, ja, ja-chars, zh)
    #[arg(long = "preset", id = "preset", default_value = "default")]
    pub preset: String,

    /// Override the preset's match strategy (words, characters, paragraphs)
    #[arg(long = "strategy")]
    pub strategy: Option<String>,

    /// Override the preset's OCR language
    #[arg(long = "language", value_name = "LANG")]
    pub language: Option<String>,

    /// Drop candidates scoring below this confidence (0-1)
    #[arg(
        long = "threshold",
        id = "confidence_threshold",
        default_value_t = 0.2
    )]
    pub confidence_threshold: f32,

    /// Credit given to mismatches in words the OCR engine was unsure about (0-1)
    #[arg(
        long = "unconfidence-ratio",
        id = "ocr_unconfidence_ratio",
        default_value_t = 0.4
    )]
    pub ocr_unconfidence_ratio: f32,

    /// Enable or disable priority decay of partial matches left behind by the scan
    #[arg(long = "carry-decay", value_parser = clap::value_parser!(bool))]
    pub carry_decay: Option<bool>,

    /// Expected position as fractions of the image: x,y or x,y,radius
    #[arg(long = "near", value_name = "X,Y[,R]")]
    pub near: Option<LocationHint>,

    /// Expected text color (#rrggbb)
    #[arg(long = "fg", value_name = "COLOR")]
    pub foreground: Option<Rgb>,

    /// Expected background color (#rrggbb); only used with --fg
    #[arg(long = "bg", value_name = "COLOR")]
    pub background: Option<Rgb>,

    /// Print at most this many candidates
    #[arg(long = "limit", value_parser = clap::value_parser!(usize))]
    pub limit: Option<usize>,

    /// Print a JSON report instead of one line per candidate
    #[arg(long = "json")]
    pub json: bool,

    /// Click the best candidate
    #[arg(long = "click")]
    pub click: bool,

    /// OCR engine
    #[arg(long = "engine", id = "engine", value_enum, default_value_t = EngineKind::Tesseract)]
    pub engine: EngineKind,

    /// Path of the tesseract executable
    #[arg(long = "tesseract", value_name = "PATH")]
    pub tesseract: Option<PathBuf>,

    /// Tesseract page segmentation mode
    #[arg(long = "psm", value_parser = clap::value_parser!(u32).range(0..=13))]
    pub psm: Option<u32>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
