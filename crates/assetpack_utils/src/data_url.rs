use std::path::Path;

/// Encodes `bytes` as a base64 `data:` URL.
///
/// The media type comes from the file extension first; content sniffing is the
/// fallback for extensionless or unknown files.
pub fn to_data_url(path: &Path, bytes: &[u8]) -> String {
  let media_type = guess_media_type(path, bytes);
  let encoded = base64_simd::STANDARD.encode_to_string(bytes);
  format!("data:{media_type};base64,{encoded}")
}

pub fn guess_media_type(path: &Path, bytes: &[u8]) -> String {
  let by_extension = path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_ascii_lowercase)
    .and_then(|ext| media_type_from_extension(&ext));

  by_extension
    .or_else(|| infer::get(bytes).map(|kind| kind.mime_type().to_string()))
    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

fn media_type_from_extension(ext: &str) -> Option<String> {
  let media_type = match ext {
    "png" => mime::IMAGE_PNG.to_string(),
    "jpg" | "jpeg" => mime::IMAGE_JPEG.to_string(),
    "gif" => mime::IMAGE_GIF.to_string(),
    "bmp" => mime::IMAGE_BMP.to_string(),
    "svg" => mime::IMAGE_SVG.to_string(),
    "webp" => "image/webp".to_string(),
    "ico" => "image/x-icon".to_string(),
    "css" => mime::TEXT_CSS.to_string(),
    "woff" => mime::FONT_WOFF.to_string(),
    "woff2" => mime::FONT_WOFF2.to_string(),
    "ttf" => "font/ttf".to_string(),
    "otf" => "font/otf".to_string(),
    "eot" => "application/vnd.ms-fontobject".to_string(),
    _ => return None,
  };
  Some(media_type)
}

#[test]
fn test_to_data_url() {
  assert_eq!(to_data_url(Path::new("dot.gif"), b"GIF89a"), "data:image/gif;base64,R0lGODlh");
  assert_eq!(
    to_data_url(Path::new("icon.svg"), b"<svg/>"),
    "data:image/svg+xml;base64,PHN2Zy8+"
  );
}

#[test]
fn test_guess_media_type_sniffs_unknown_extensions() {
  let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
  assert_eq!(guess_media_type(Path::new("sprite.bin"), &png_magic), "image/png");
  assert_eq!(guess_media_type(Path::new("blob"), b"??"), "application/octet-stream");
}
