use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;
use untriseptium_matcher::{MatchStrategy, MatcherConfig, MatcherConfigError, Preset};
use untriseptium_ocr::PyramidConfig;

use crate::cli::{CliArgs, CliSources, EngineKind};
use crate::session::SessionSettings;

const PROJECT_CONFIG_FILE: &str = "untriseptium.toml";
const DEFAULT_THREAD_LIMIT: u32 = 1;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    preset: Option<String>,
    strategy: Option<String>,
    language: Option<String>,
    confidence_threshold: Option<f32>,
    ocr_unconfidence_ratio: Option<f32>,
    carry_decay: Option<bool>,
    ocr: Option<OcrFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct OcrFileConfig {
    engine: Option<String>,
    tesseract: Option<String>,
    psm: Option<u32>,
    thread_limit: Option<u32>,
    min_strip_height: Option<u32>,
    max_recursion_depth: Option<u32>,
}

#[derive(Debug)]
pub struct EffectiveSettings {
    pub preset: Preset,
    pub session: SessionSettings,
    pub engine: EngineKind,
    pub tesseract: Option<PathBuf>,
    pub psm: Option<u32>,
    /// `None` leaves the engine's thread count alone.
    pub thread_limit: Option<u32>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    let candidates = [project_config_path(), default_config_path()];
    for path in candidates.into_iter().flatten() {
        if path.exists() {
            let config = read_config(&path)?;
            return Ok((config, Some(path)));
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        preset: file_preset,
        strategy: file_strategy,
        language: file_language,
        confidence_threshold: file_threshold,
        ocr_unconfidence_ratio: file_ratio,
        carry_decay: file_carry_decay,
        ocr: file_ocr,
    } = file;
    let file_ocr = file_ocr.unwrap_or_default();

    let mut preset_name = cli.preset.clone();
    let mut preset_path = None;
    if !sources.preset_from_cli {
        if let Some(value) = normalize_string(file_preset) {
            preset_name = value;
            preset_path = config_path.clone();
        }
    }
    let preset = Preset::lookup(&preset_name).map_err(|_| ConfigError::InvalidValue {
        path: preset_path,
        field: "preset",
        value: preset_name.clone(),
    })?;

    let mut strategy = preset.strategy;
    if let Some(value) = normalize_string(cli.strategy.clone()) {
        strategy = parse_strategy(&value, None)?;
    } else if let Some(value) = normalize_string(file_strategy) {
        strategy = parse_strategy(&value, config_path.as_ref())?;
    }

    let language = normalize_string(cli.language.clone())
        .or_else(|| normalize_string(file_language))
        .unwrap_or_else(|| preset.language.to_string());

    let mut confidence_threshold = cli.confidence_threshold;
    let mut threshold_path = None;
    if !sources.threshold_from_cli {
        if let Some(value) = file_threshold {
            confidence_threshold = value;
            threshold_path = config_path.clone();
        }
    }

    let mut ocr_unconfidence_ratio = cli.ocr_unconfidence_ratio;
    let mut ratio_path = None;
    if !sources.unconfidence_ratio_from_cli {
        if let Some(value) = file_ratio {
            ocr_unconfidence_ratio = value;
            ratio_path = config_path.clone();
        }
    }

    let carry_decay = cli.carry_decay.or(file_carry_decay).unwrap_or(true);

    let matcher = MatcherConfig {
        confidence_threshold,
        ocr_unconfidence_ratio,
        strategy,
        carry_decay,
    };
    matcher.validate().map_err(|err| match err {
        MatcherConfigError::OutOfRange { field, value } => ConfigError::InvalidValue {
            path: if field == "confidence_threshold" {
                threshold_path
            } else {
                ratio_path
            },
            field,
            value: value.to_string(),
        },
        other => ConfigError::InvalidValue {
            path: None,
            field: "matcher",
            value: other.to_string(),
        },
    })?;

    let mut engine = cli.engine;
    if !sources.engine_from_cli {
        if let Some(value) = normalize_string(file_ocr.engine.clone()) {
            engine = parse_engine(&value, config_path.as_ref())?;
        }
    }

    let tesseract = match cli.tesseract.clone() {
        Some(path) => Some(expand_pathbuf(path)),
        None => normalize_string(file_ocr.tesseract.clone())
            .and_then(|value| resolve_path_from_config(value, config_dir.as_deref())),
    };

    let psm = cli.psm.or(file_ocr.psm);
    if let Some(value) = psm.filter(|value| *value > 13) {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "ocr.psm",
            value: value.to_string(),
        });
    }

    let thread_limit = match file_ocr.thread_limit {
        Some(0) => None,
        Some(value) => Some(value),
        None => Some(DEFAULT_THREAD_LIMIT),
    };

    let defaults = PyramidConfig::default();
    let pyramid = PyramidConfig {
        min_strip_height: file_ocr.min_strip_height.unwrap_or(defaults.min_strip_height),
        max_recursion_depth: file_ocr
            .max_recursion_depth
            .unwrap_or(defaults.max_recursion_depth),
    };
    if pyramid.min_strip_height == 0 {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "ocr.min_strip_height",
            value: "0".to_string(),
        });
    }

    Ok(EffectiveSettings {
        preset,
        session: SessionSettings {
            language: Some(language),
            matcher,
            pyramid,
        },
        engine,
        tesseract,
        psm,
        thread_limit,
        config_path,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "untriseptium", "untriseptium")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if expanded.is_relative() && expanded.components().count() > 1 => {
            Some(base.join(expanded))
        }
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

fn parse_strategy(value: &str, path: Option<&PathBuf>) -> Result<MatchStrategy, ConfigError> {
    value
        .parse::<MatchStrategy>()
        .map_err(|_| ConfigError::InvalidValue {
            path: path.cloned(),
            field: "strategy",
            value: value.to_string(),
        })
}

fn parse_engine(value: &str, path: Option<&PathBuf>) -> Result<EngineKind, ConfigError> {
    EngineKind::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
        path: path.cloned(),
        field: "ocr.engine",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::try_parse_cli_from;

    fn settings_with(config: &str, extra_args: &[&str]) -> Result<EffectiveSettings, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untriseptium.toml");
        fs::write(&path, config).unwrap();
        let mut args = vec![
            "untriseptium".to_string(),
            "shot.png".to_string(),
            "OK".to_string(),
            "--config".to_string(),
            path.display().to_string(),
        ];
        args.extend(extra_args.iter().map(|arg| arg.to_string()));
        let (cli, sources) = try_parse_cli_from(args).unwrap();
        resolve_settings(&cli, &sources)
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let settings = settings_with("", &[]).unwrap();
        assert_eq!(settings.preset.name, "default");
        assert_eq!(settings.session.language.as_deref(), Some("eng"));
        assert_eq!(settings.session.matcher, MatcherConfig::default());
        assert_eq!(settings.session.pyramid, PyramidConfig::default());
        assert_eq!(settings.engine, EngineKind::Tesseract);
        assert_eq!(settings.thread_limit, Some(1));
        assert!(settings.config_path.is_some());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = r#"
preset = "ja"
confidence_threshold = 0.35
carry_decay = false

[ocr]
engine = "noop"
psm = 6
thread_limit = 0
min_strip_height = 48
max_recursion_depth = 2
"#;
        let settings = settings_with(config, &[]).unwrap();
        assert_eq!(settings.preset.name, "ja");
        assert_eq!(settings.session.language.as_deref(), Some("jpn"));
        assert_eq!(settings.session.matcher.strategy, MatchStrategy::Paragraphs);
        assert_eq!(settings.session.matcher.confidence_threshold, 0.35);
        assert!(!settings.session.matcher.carry_decay);
        assert_eq!(settings.engine, EngineKind::Noop);
        assert_eq!(settings.psm, Some(6));
        assert_eq!(settings.thread_limit, None);
        assert_eq!(settings.session.pyramid.min_strip_height, 48);
        assert_eq!(settings.session.pyramid.max_recursion_depth, 2);
    }

    #[test]
    fn command_line_wins_over_file() {
        let config = "preset = \"ja\"\nconfidence_threshold = 0.35\nstrategy = \"words\"\n";
        let settings = settings_with(
            config,
            &["--preset", "zh", "--threshold", "0.6", "--strategy", "paragraphs"],
        )
        .unwrap();
        assert_eq!(settings.preset.name, "zh");
        assert_eq!(settings.session.language.as_deref(), Some("chi_sim"));
        assert_eq!(settings.session.matcher.confidence_threshold, 0.6);
        assert_eq!(settings.session.matcher.strategy, MatchStrategy::Paragraphs);
    }

    #[test]
    fn explicit_default_on_command_line_still_wins() {
        let settings =
            settings_with("confidence_threshold = 0.35\n", &["--threshold", "0.2"]).unwrap();
        assert_eq!(settings.session.matcher.confidence_threshold, 0.2);
    }

    #[test]
    fn invalid_values_name_the_field() {
        match settings_with("preset = \"klingon\"\n", &[]) {
            Err(ConfigError::InvalidValue { field, path, .. }) => {
                assert_eq!(field, "preset");
                assert!(path.is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
        match settings_with("ocr_unconfidence_ratio = 2.0\n", &[]) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "ocr_unconfidence_ratio")
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            settings_with("[ocr]\nengine = \"paddle\"\n", &[]),
            Err(ConfigError::InvalidValue {
                field: "ocr.engine",
                ..
            })
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        assert!(matches!(
            settings_with("preset = [", &[]),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_explicit_config_is_reported() {
        let (cli, sources) = try_parse_cli_from([
            "untriseptium",
            "shot.png",
            "OK",
            "--config",
            "/nonexistent/untriseptium.toml",
        ])
        .unwrap();
        assert!(matches!(
            resolve_settings(&cli, &sources),
            Err(ConfigError::NotFound { .. })
        ));
    }
}
