//! Property-based tests for pf-core
//!
//! These tests verify correctness properties using proptest.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::capture::ThumbnailCapture;
    use crate::config::CaptureConfig;
    use crate::encode::quality_percent;
    use crate::harness::ScriptedVideo;
    use crate::source::VideoMetadata;
    use crate::surface::CaptureSurface;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    // Midpoint selection: for any positive finite duration the seek target
    // is exactly half of it.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_midpoint_is_half_duration(duration in 0.001f64..86_400.0) {
            let meta = VideoMetadata { duration, width: 2, height: 2 };
            prop_assert_eq!(meta.midpoint(), Some(duration / 2.0));
        }

        #[test]
        fn test_non_positive_duration_has_no_midpoint(duration in -86_400.0f64..=0.0) {
            let meta = VideoMetadata { duration, width: 2, height: 2 };
            prop_assert_eq!(meta.midpoint(), None);
        }
    }

    // Quality mapping stays in the encoder's 1-100 range and is monotonic.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_quality_percent_in_range(q in 0.0001f32..=1.0) {
            let percent = quality_percent(q).unwrap();
            prop_assert!((1..=100).contains(&percent));
        }

        #[test]
        fn test_quality_percent_monotonic(a in 0.0001f32..=1.0, b in 0.0001f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(quality_percent(lo).unwrap() <= quality_percent(hi).unwrap());
        }
    }

    // Resizing always yields a cleared buffer of exactly width*height*4 bytes.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_surface_resize_len(w in 0u32..512, h in 0u32..512) {
            let mut surface = CaptureSurface::with_size(7, 3);
            surface.fill([1, 2, 3, 4]);
            surface.resize(w, h);

            prop_assert_eq!(surface.pixels().len(), w as usize * h as usize * 4);
            prop_assert!(surface.pixels().iter().all(|b| *b == 0));
        }
    }

    // The stored image always has the video's native dimensions and the
    // seek target is the midpoint, for any capture that proceeds.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(25))]

        #[test]
        fn test_capture_dimension_fidelity(
            w in 1u32..96,
            h in 1u32..96,
            duration in 0.1f64..3_600.0,
        ) {
            let rt = runtime();
            let video = Arc::new(ScriptedVideo::loaded(duration, w, h));
            let capture = ThumbnailCapture::attach(CaptureConfig::default(), video.clone());

            let outcome = rt.block_on(capture.capture()).unwrap();
            let image = outcome.image().cloned().unwrap();

            prop_assert_eq!((image.width(), image.height()), (w, h));
            prop_assert_eq!(video.seek_requests(), vec![duration / 2.0]);
        }
    }
}
