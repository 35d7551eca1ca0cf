mod app;
mod closing;
mod commands;
mod persistence;

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use eframe::{egui, NativeOptions};
use quillpad_settings::{LanguageProvider, LocalizationManager};
use tracing_subscriber::EnvFilter;

use crate::app::QuillpadApp;

const APP_TITLE: &str = "Quillpad";
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Parser, Debug)]
#[command(name = "quillpad", version, about = "Multi-document plain text editor")]
struct Args {
    /// Files to open at startup
    files: Vec<PathBuf>,
    /// Interface language code, overriding the stored preference
    #[arg(long)]
    language: Option<String>,
    /// Directory with additional locale files
    #[arg(long)]
    locales_dir: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_localization(dir: Option<&PathBuf>) -> LocalizationManager {
    let Some(dir) = dir else {
        return LocalizationManager::builtin();
    };
    match LocalizationManager::load_from_dir(dir, DEFAULT_LANGUAGE) {
        Ok(manager) => manager,
        Err(err) => {
            tracing::warn!("ignoring locale directory {}: {err}", dir.display());
            LocalizationManager::builtin()
        }
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_logging();

    let preferences = persistence::load_preferences();
    let (language, width, height) = match &preferences {
        Some(store) => {
            let prefs = store.preferences();
            (
                prefs.ui.language.clone(),
                prefs.ui.window_width as f32,
                prefs.ui.window_height as f32,
            )
        }
        None => (DEFAULT_LANGUAGE.to_string(), 900.0, 600.0),
    };

    let provider = Rc::new(LanguageProvider::new(load_localization(
        args.locales_dir.as_ref(),
    )));
    let requested = args.language.unwrap_or(language);
    if let Err(err) = provider.set_language(&requested) {
        tracing::warn!("keeping default language: {err}");
    }

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([width, height]),
        ..Default::default()
    };
    let files = args.files;
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Box::new(QuillpadApp::new(provider, preferences, files))),
    )
}
