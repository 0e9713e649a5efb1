//! End-to-end batch flow over the real image backend.

use bytes::Bytes;
use mediabatch::{
    BatchConverter, ConversionConfig, EntryStatus, FfmpegTranscoder, ImageConfig, ImageConverter,
    ImageFormat, MediaKind, SourceFile,
};
use std::io::Cursor;
use std::sync::Arc;

fn converter() -> BatchConverter {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    BatchConverter::new(
        Arc::new(ImageConverter::new()),
        Arc::new(FfmpegTranscoder::new()),
    )
}

fn sample_jpeg(width: u32, height: u32) -> Bytes {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 64])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(out.into_inner())
}

fn png_config() -> ConversionConfig {
    ConversionConfig::Image(ImageConfig {
        format: ImageFormat::Png,
        quality: 80,
        width: None,
        height: None,
    })
}

#[tokio::test]
async fn jpeg_batch_converts_to_png() {
    let converter = converter();
    let count = converter
        .admit(
            MediaKind::Image,
            vec![SourceFile::new("photo.jpg", "image/jpeg", sample_jpeg(48, 32))],
        )
        .unwrap();
    assert_eq!(count, 1);

    let report = converter.run(&png_config()).await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);

    converter.with_batch(|batch| {
        let entry = batch.get(0).unwrap();
        assert_eq!(entry.progress(), 100);
        assert_eq!(entry.status(), EntryStatus::Succeeded);

        let artifact = entry.output().unwrap();
        assert_eq!(artifact.mime, "image/png");
        assert_eq!(
            image::guess_format(&artifact.data).unwrap(),
            image::ImageFormat::Png
        );
    });
}

#[tokio::test]
async fn removal_before_run_reindexes_batch() {
    let converter = converter();
    converter
        .admit(
            MediaKind::Image,
            vec![
                SourceFile::new("one.jpg", "image/jpeg", sample_jpeg(8, 8)),
                SourceFile::new("two.jpg", "image/jpeg", sample_jpeg(9, 9)),
                SourceFile::new("three.jpg", "image/jpeg", sample_jpeg(10, 10)),
            ],
        )
        .unwrap();

    converter.remove(1).unwrap();

    converter.with_batch(|batch| {
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get(1).unwrap().item().name(), "three.jpg");
    });

    let report = converter.run(&png_config()).await.unwrap();
    assert_eq!(report.succeeded, 2);
}

#[tokio::test]
async fn export_after_run_writes_named_artifacts() {
    let converter = converter();
    converter
        .admit(
            MediaKind::Image,
            vec![
                SourceFile::new("alpha.jpg", "image/jpeg", sample_jpeg(16, 16)),
                SourceFile::new("beta.landscape.jpg", "image/jpeg", sample_jpeg(16, 16)),
            ],
        )
        .unwrap();
    converter.run(&png_config()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = converter.export_all(dir.path()).unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].file_name().unwrap(), "alpha.png");
    // Stem cuts at the first dot, matching the download naming.
    assert_eq!(paths[1].file_name().unwrap(), "beta.png");

    let single = converter.export_one(0, dir.path()).unwrap();
    assert!(single.exists());
}

#[tokio::test]
async fn export_before_run_reports_no_output() {
    let converter = converter();
    converter
        .admit(
            MediaKind::Image,
            vec![SourceFile::new("photo.jpg", "image/jpeg", sample_jpeg(8, 8))],
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    assert!(converter.export_one(0, dir.path()).is_err());
    // export_all simply has nothing to write.
    assert!(converter.export_all(dir.path()).unwrap().is_empty());
}
