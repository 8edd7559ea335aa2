//! Downloading results, file naming, and format conversion.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::BananaError;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Generate an output filename: `banana-ai-<unix-ts>.<ext>`.
#[must_use]
pub fn auto_filename(ext: &str) -> String {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format!("banana-ai-{timestamp}.{ext}")
}

/// Resolve the output path: use the explicit path or auto-generate a PNG name.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(auto_filename("png")),
    }
}

/// Output format implied by a path's extension. No extension means PNG.
///
/// # Errors
///
/// Returns [`BananaError::Validation`] for extensions other than png, jpg,
/// jpeg and webp.
pub fn format_for_path(path: &Path) -> Result<ImageFormat, BananaError> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(ImageFormat::Png);
    };
    match ext.to_ascii_lowercase().as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "webp" => Ok(ImageFormat::WebP),
        other => Err(BananaError::Validation(format!(
            "Unsupported output format: {other}. Use png, jpg or webp"
        ))),
    }
}

/// Fetch an image over HTTP.
///
/// # Errors
///
/// Returns an error on transport failure or a non-2xx status.
pub async fn download_image(url: &str) -> Result<Vec<u8>, BananaError> {
    let client = reqwest::Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(BananaError::Api {
            status: status.as_u16(),
            message: format!("Failed to download {url}"),
        });
    }
    let bytes = response.bytes().await?;
    debug!(%url, bytes = bytes.len(), "image downloaded");
    Ok(bytes.to_vec())
}

/// Save image bytes to `output_path`, converting to the format its
/// extension names when the source differs.
///
/// # Errors
///
/// Returns an error if the file cannot be written or conversion fails.
pub fn save_image(data: &[u8], output_path: &Path) -> Result<(), BananaError> {
    let target = format_for_path(output_path)?;
    let source = image::guess_format(data).ok();

    if source == Some(target) {
        std::fs::write(output_path, data).map_err(BananaError::Io)
    } else {
        convert_and_save(data, target, output_path)
    }
}

fn convert_and_save(
    data: &[u8],
    target: ImageFormat,
    output_path: &Path,
) -> Result<(), BananaError> {
    let img = image::load_from_memory(data)
        .map_err(|e| BananaError::ImageConversion(format!("Failed to decode image: {e}")))?;

    // JPEG has no alpha channel.
    let img = if target == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };

    img.save_with_format(output_path, target).map_err(|e| {
        BananaError::ImageConversion(format!("Failed to save as {target:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{Rgba, RgbaImage};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn auto_filename_format() {
        let name = auto_filename("png");
        assert!(name.starts_with("banana-ai-"));
        assert_eq!(Path::new(&name).extension().unwrap(), "png");
    }

    #[test]
    fn resolve_explicit() {
        let path = resolve_output_path(Some("my-image.jpg"));
        assert_eq!(path, PathBuf::from("my-image.jpg"));
    }

    #[test]
    fn resolve_auto_is_png() {
        let path = resolve_output_path(None);
        assert!(path.to_str().unwrap().starts_with("banana-ai-"));
        assert_eq!(path.extension().unwrap(), "png");
    }

    #[test]
    fn formats_from_extension() {
        assert_eq!(format_for_path(Path::new("a.png")).unwrap(), ImageFormat::Png);
        assert_eq!(format_for_path(Path::new("a.JPG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("a.webp")).unwrap(), ImageFormat::WebP);
        assert_eq!(format_for_path(Path::new("a")).unwrap(), ImageFormat::Png);
        assert!(matches!(format_for_path(Path::new("a.gif")), Err(BananaError::Validation(_))));
    }

    #[test]
    fn same_format_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let data = png_bytes();

        save_image(&data, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[test]
    fn png_converted_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");

        save_image(&png_bytes(), &path).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_fails_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let err = save_image(b"not an image", &path).unwrap_err();
        assert!(matches!(err, BananaError::ImageConversion(_)));
    }

    #[tokio::test]
    async fn download_fetches_bytes() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
            .mount(&server)
            .await;

        let bytes = download_image(&format!("{}/a.png", server.uri())).await.unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[tokio::test]
    async fn download_non_2xx_is_api_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let err = download_image(&format!("{}/gone.png", server.uri())).await.unwrap_err();
        assert!(matches!(err, BananaError::Api { status: 404, .. }));
    }
}
