use std::path::PathBuf;

use anyhow::bail;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod compositor;
mod config;
mod editor;
mod history;
mod processing;
mod router;
mod source;
mod tools;
mod viewport;

use app::{EditorCallbacks, RetouchApp};
use config::AppConfig;
use source::ImageSource;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(raw) = std::env::args().nth(1) else {
        bail!("usage: retouch <image-path | data-uri>");
    };
    let source = ImageSource::from(raw.as_str());
    if let ImageSource::Path(ref path) = source {
        if !source::looks_like_image(path) {
            warn!(path = %path.display(), "path has no recognized image extension");
        }
    }

    let output = output_path(&source);
    let callbacks = EditorCallbacks {
        on_close: Box::new(|| info!("editor closed without saving")),
        on_save: Box::new(move |uri| match source::png_bytes_from_data_uri(&uri) {
            Ok(bytes) => match std::fs::write(&output, &bytes) {
                Ok(()) => info!(path = %output.display(), "saved edited image"),
                Err(err) => warn!(%err, "writing edited image failed"),
            },
            Err(err) => warn!(%err, "export payload was not a PNG data URI"),
        }),
    };

    let config = AppConfig::load();
    let size = [
        config.window_width.unwrap_or(1100.0),
        config.window_height.unwrap_or(750.0),
    ];
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(size)
            .with_title("Retouch"),
        ..Default::default()
    };

    eframe::run_native(
        "Retouch",
        options,
        Box::new(move |cc| Ok(Box::new(RetouchApp::new(cc, config, source, callbacks)?))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Where the standalone host writes the result: next to a file source, or
/// the working directory for data URI sources.
fn output_path(source: &ImageSource) -> PathBuf {
    match source {
        ImageSource::Path(path) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let name = format!("{stem}_edited.png");
            // A bare filename has Some("") as its parent.
            match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
                _ => PathBuf::from(name),
            }
        }
        ImageSource::DataUri(_) => PathBuf::from("retouched.png"),
    }
}
