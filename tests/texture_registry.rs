use std::fs;

use softraster::colors::Color;
use softraster::png::PngDecoder;
use softraster::texture::TextureRegistry;
use softraster::{DecodeError, LoadError};

fn write_png(path: &std::path::Path, width: u32, height: u32, rgba: &[u8]) {
    image::save_buffer(path, rgba, width, height, image::ExtendedColorType::Rgba8).unwrap();
}

#[test]
fn png_loads_through_own_decoder_and_dedupes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.png");
    #[rustfmt::skip]
    let rgba = [
        255, 0, 0, 255,   0, 255, 0, 255,
        0, 0, 255, 255,   255, 255, 255, 255,
    ];
    write_png(&path, 2, 2, &rgba);

    let mut registry = TextureRegistry::new();
    let first = registry.load(&path).unwrap();
    let second = registry.load(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);

    let texture = registry.get(first).unwrap();
    assert_eq!((texture.width(), texture.height(), texture.channels()), (2, 2, 4));
    assert_eq!(texture.data(), rgba);
    assert_eq!(texture.texel(1, 0), Color::rgb(0, 255, 0));
    // V = 1 is the top row.
    assert_eq!(texture.sample(0.25, 0.75), Color::rgb(255, 0, 0));
    assert_eq!(texture.sample(0.75, 0.25), Color::rgb(255, 255, 255));
}

#[test]
fn other_formats_go_through_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.bmp");
    image::save_buffer(&path, &[10, 20, 30], 1, 1, image::ExtendedColorType::Rgb8).unwrap();

    let mut registry = TextureRegistry::new();
    let id = registry.load(&path).unwrap();
    let texture = registry.get(id).unwrap();
    assert_eq!(texture.channels(), 4);
    assert_eq!(texture.texel(0, 0), Color::rgb(10, 20, 30));
}

#[test]
fn failures_leave_registry_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = TextureRegistry::new();

    let missing = registry.load(dir.path().join("missing.png")).unwrap_err();
    assert!(matches!(missing, LoadError::FileNotFound(_)));

    let bogus = dir.path().join("bogus.png");
    fs::write(&bogus, b"definitely not a png").unwrap();
    let err = registry.load(&bogus).unwrap_err();
    assert!(matches!(err, LoadError::Decode(DecodeError::Header)));

    assert!(registry.is_empty());
}

#[test]
fn decoder_memory_limit_applies_to_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.png");
    write_png(&path, 16, 16, &[7u8; 16 * 16 * 4]);

    let mut registry = TextureRegistry::with_decoder(PngDecoder::new().memory_limit(64));
    let err = registry.load(&path).unwrap_err();
    assert!(matches!(err, LoadError::Decode(DecodeError::Memory { .. })));
}
