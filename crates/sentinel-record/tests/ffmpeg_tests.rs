#[cfg(feature = "ffmpeg")]
mod ffmpeg_tests {
    use sentinel_base::Vec2;
    use sentinel_image::Frame;
    use sentinel_record::ffmpeg::find_ffmpeg;
    use sentinel_record::{DefaultSinkFactory, FourCc, RecordError, SinkFactory, VideoSink};
    use std::fs;

    #[test]
    fn test_mp4v_through_ffmpeg() {
        // needs an ffmpeg binary on this machine
        if find_ffmpeg().is_none() {
            eprintln!("ffmpeg not available, skipping");
            return;
        }
        let path = std::env::temp_dir().join(format!("sentinel-ffmpeg-{}.mp4", std::process::id()));
        let size = Vec2::new(64, 48);
        let mut sink = DefaultSinkFactory::new()
            .open(&path, FourCc::MP4V, 10, size)
            .unwrap();
        for shade in 0..10u8 {
            sink.write(&Frame::solid(size, [shade * 20, 0, 0])).unwrap();
        }
        sink.close().unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_codec_is_writer_init() {
        let path = std::env::temp_dir().join(format!("sentinel-ffmpeg-{}.bin", std::process::id()));
        match DefaultSinkFactory::new().open(&path, FourCc::new(b"WMV3"), 10, Vec2::new(8, 8)) {
            Err(RecordError::WriterInit(_)) => {}
            Err(other) => panic!("Expected WriterInit, got {}", other),
            Ok(_) => panic!("Expected WriterInit"),
        }
    }

    #[test]
    fn test_configured_binary_is_used_without_searching() {
        let path = std::env::temp_dir().join(format!("sentinel-ffmpeg-{}-fixed.mp4", std::process::id()));
        let factory = DefaultSinkFactory::new().with_ffmpeg("/nonexistent/sentinel-ffmpeg");
        for _ in 0..2 {
            match factory.open(&path, FourCc::MP4V, 10, Vec2::new(8, 8)) {
                Err(RecordError::WriterInit(reason)) => assert!(reason.contains("cannot start ffmpeg")),
                Err(other) => panic!("Expected WriterInit, got {}", other),
                Ok(_) => panic!("Expected WriterInit"),
            }
        }
        assert!(!path.exists());
    }
}
