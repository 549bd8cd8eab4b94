use super::*;
use tempfile::TempDir;

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];

#[test]
fn test_sniff_mime_from_magic_bytes() {
    assert_eq!(sniff_mime(PNG_HEADER), Some("image/png"));
    assert_eq!(sniff_mime(JPEG_HEADER), Some("image/jpeg"));
    assert_eq!(sniff_mime(b"GIF89a..."), Some("image/gif"));
    assert_eq!(sniff_mime(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some("image/webp"));
    assert_eq!(sniff_mime(b"RIFF\x10\x00\x00\x00WAVE"), None);
    assert_eq!(sniff_mime(b""), None);
}

#[test]
fn test_magic_bytes_beat_extension() {
    let payload = ImagePayload::from_bytes(JPEG_HEADER, Some(Path::new("photo.png")));
    assert_eq!(payload.mime_type, "image/jpeg");
    assert_eq!(payload.extension(), "jpg");
}

#[test]
fn test_extension_then_png_fallback() {
    let payload = ImagePayload::from_bytes(b"opaque", Some(Path::new("a.WEBP")));
    assert_eq!(payload.mime_type, "image/webp");

    let payload = ImagePayload::from_bytes(b"opaque", None);
    assert_eq!(payload.mime_type, DEFAULT_MIME);
    assert_eq!(payload.extension(), "png");
}

#[test]
fn test_save_decodes_into_nested_directory() {
    let temp = TempDir::new().unwrap();
    let payload = ImagePayload::from_bytes(PNG_HEADER, None);
    let target = temp.path().join("out").join("image.png");

    payload.save(&target).unwrap();
    assert_eq!(fs::read(&target).unwrap(), PNG_HEADER);
}

#[test]
fn test_decode_rejects_garbage() {
    let payload = ImagePayload {
        mime_type: DEFAULT_MIME.to_string(),
        data: "not base64!!".to_string(),
    };
    assert!(matches!(
        payload.decode(),
        Err(SessionError::InvalidImageData { .. })
    ));
}

#[test]
fn test_image_source_path_reads_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("input.jpg");
    fs::write(&path, JPEG_HEADER).unwrap();

    let source = ImageSource::Path { path: path.clone() };
    let payload = source.to_payload().unwrap();
    assert_eq!(payload.decode().unwrap(), JPEG_HEADER);

    fs::remove_file(&path).unwrap();
    assert!(matches!(
        source.to_payload(),
        Err(SessionError::ImageRead { .. })
    ));
}

#[test]
fn test_image_source_serializes_with_kind_tag() {
    let source = ImageSource::from(ImagePayload::from_bytes(PNG_HEADER, None));
    let json = serde_json::to_value(&source).unwrap();
    assert_eq!(json["kind"], "embedded");
    assert_eq!(json["mime_type"], "image/png");

    let back: ImageSource = serde_json::from_value(json).unwrap();
    assert_eq!(back, source);
}

#[test]
fn test_dimensions_from_png_and_gif_headers() {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&1024u32.to_be_bytes());
    png.extend_from_slice(&768u32.to_be_bytes());
    assert_eq!(dimensions(&png), Some((1024, 768)));

    let mut gif = b"GIF89a".to_vec();
    gif.extend_from_slice(&640u16.to_le_bytes());
    gif.extend_from_slice(&480u16.to_le_bytes());
    assert_eq!(dimensions(&gif), Some((640, 480)));

    assert_eq!(dimensions(JPEG_HEADER), None);
    assert_eq!(dimensions(PNG_HEADER), None);
}
