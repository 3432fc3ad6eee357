use std::process::ExitCode;

use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use untriseptium::cli::{CliArgs, EngineKind, parse_cli};
use untriseptium::report::{CandidateReport, SearchReport};
use untriseptium::settings::{ConfigError, EffectiveSettings, resolve_settings};
use untriseptium::{ColorHint, ImageFileFrontend, NoopOcrEngine, OcrEngine, Untriseptium};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] untriseptium::Error),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(not(feature = "engine-tesseract"))]
    #[error("engine '{0}' is not compiled into this build")]
    EngineUnavailable(&'static str),
}

fn main() -> ExitCode {
    let (cli, sources) = parse_cli();
    init_logging(cli.verbose);

    let settings = match resolve_settings(&cli, &sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match run(&cli, settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already installed");
    }
}

/// Returns whether any candidate was found.
fn run(cli: &CliArgs, settings: EffectiveSettings) -> Result<bool, AppError> {
    if let Some(path) = settings.config_path.as_ref() {
        debug!(path = %path.display(), "loaded config");
    }
    let engine = build_engine(&settings)?;
    if let Err(err) = engine.warm_up() {
        warn!(engine = engine.name(), error = %err, "engine warm-up failed");
    }

    let color = match (cli.foreground, cli.background) {
        (Some(foreground), background) => Some(ColorHint {
            foreground,
            background,
        }),
        (None, Some(_)) => {
            warn!("--bg is ignored without --fg");
            None
        }
        (None, None) => None,
    };

    let preset = settings.preset.name;
    let strategy = settings.session.matcher.strategy.as_str();
    let frontend = ImageFileFrontend::new(&cli.image);
    let mut session = Untriseptium::new(frontend, engine, settings.session)?;

    let records = session.ocr()?.len();
    info!(image = %cli.image.display(), records, preset, strategy, "ocr complete");

    let mut candidates = session.find_texts(&cli.text, cli.near.as_ref(), color.as_ref())?;
    if let Some(limit) = cli.limit {
        candidates.truncate(limit);
    }

    let mut clicked = None;
    if cli.click {
        match candidates.first() {
            Some(best) => {
                let (x, y) = best.center();
                session.click(best)?;
                clicked = Some([x, y]);
            }
            None => warn!(text = %cli.text, "nothing to click"),
        }
    }

    let report = SearchReport {
        image: cli.image.clone(),
        target: cli.text.clone(),
        preset,
        strategy,
        candidates: candidates.iter().map(CandidateReport::from).collect(),
        clicked,
    };
    if cli.json {
        println!("{}", report.to_json(true)?);
    } else {
        for candidate in &report.candidates {
            println!("{candidate}");
        }
    }
    Ok(!report.candidates.is_empty())
}

fn build_engine(settings: &EffectiveSettings) -> Result<Box<dyn OcrEngine>, AppError> {
    match settings.engine {
        EngineKind::Noop => Ok(Box::new(NoopOcrEngine)),
        #[cfg(feature = "engine-tesseract")]
        EngineKind::Tesseract => {
            let mut engine = untriseptium::TesseractCliEngine::new()
                .with_page_segmentation_mode(settings.psm)
                .with_thread_limit(settings.thread_limit);
            if let Some(binary) = settings.tesseract.as_ref() {
                engine = engine.with_binary(binary.clone());
            }
            Ok(Box::new(engine))
        }
        #[cfg(not(feature = "engine-tesseract"))]
        EngineKind::Tesseract => Err(AppError::EngineUnavailable(EngineKind::Tesseract.as_str())),
    }
}
