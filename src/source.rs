use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{Context, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::png::PngEncoder;
use image::{ImageFormat, RgbaImage};

/// Where the source image comes from. The generation service upstream hands
/// the editor either a `data:` URI or something fetchable; fetching is the
/// caller's job, so locally that means a file path.
#[derive(Debug, Clone)]
pub enum ImageSource {
    DataUri(String),
    Path(PathBuf),
}

impl From<&str> for ImageSource {
    fn from(raw: &str) -> Self {
        if raw.starts_with("data:") {
            ImageSource::DataUri(raw.to_string())
        } else {
            ImageSource::Path(PathBuf::from(raw))
        }
    }
}

impl ImageSource {
    /// Decodes the source into the editor's internal 32-bit RGBA format.
    pub fn load(&self) -> anyhow::Result<RgbaImage> {
        match self {
            ImageSource::DataUri(uri) => decode_data_uri(uri),
            ImageSource::Path(path) => Ok(image::open(path)
                .with_context(|| format!("opening {}", path.display()))?
                .to_rgba8()),
        }
    }
}

fn decode_data_uri(uri: &str) -> anyhow::Result<RgbaImage> {
    let Some(rest) = uri.strip_prefix("data:") else {
        bail!("not a data URI");
    };
    let Some((header, payload)) = rest.split_once(',') else {
        bail!("data URI has no payload separator");
    };
    if !header.ends_with(";base64") {
        bail!("only base64 data URIs are supported");
    }
    let bytes = BASE64.decode(payload.trim()).context("decoding base64 payload")?;
    let img = image::load_from_memory(&bytes).context("decoding image payload")?;
    Ok(img.to_rgba8())
}

/// Encodes a snapshot as `data:image/png;base64,...`, the editor's sole
/// export format.
pub fn to_png_data_uri(img: &RgbaImage) -> anyhow::Result<String> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut bytes));
    img.write_with_encoder(encoder).context("encoding PNG")?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
}

/// Extracts the raw PNG bytes back out of an exported data URI. Used by the
/// demo host to write the result to disk; the editor itself only ever emits
/// the URI.
pub fn png_bytes_from_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let Some(payload) = uri.strip_prefix("data:image/png;base64,") else {
        bail!("not a PNG data URI");
    };
    BASE64.decode(payload).context("decoding base64 payload")
}

/// Guesses whether a path points at something `image` can decode, used for
/// friendlier CLI errors.
pub fn looks_like_image(path: &PathBuf) -> bool {
    ImageFormat::from_path(path).is_ok()
}
