//! Property-based tests for the posterframe CLI
//!
//! These tests verify configuration and output properties using proptest.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::str::FromStr;

    use proptest::prelude::*;

    use crate::config::{CliOverrides, Config};
    use crate::output::{OutputFormat, OutputFormatter, ProbeOutput};
    use pf_core::VideoMetadata;

    // Flag overrides always win over file values, and the result validates
    // exactly when the quality is in (0, 1].
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_quality_override_validation(quality in -1.0f32..2.0) {
            let config = Config::default().with_overrides(&CliOverrides {
                quality: Some(quality),
                ..Default::default()
            });

            prop_assert_eq!(config.capture.quality, quality);
            prop_assert_eq!(config.validate().is_ok(), quality > 0.0 && quality <= 1.0);
        }

        #[test]
        fn test_delay_overrides_applied(settle in 0u64..10_000, auto in 0u64..10_000) {
            let config = Config::default().with_overrides(&CliOverrides {
                settle_delay_ms: Some(settle),
                auto_delay_ms: Some(auto),
                ..Default::default()
            });

            prop_assert_eq!(config.capture.settle_delay_ms, settle);
            prop_assert_eq!(config.capture.auto_delay_ms, auto);
            prop_assert!(config.validate().is_ok());
        }
    }

    // Output format names are case-insensitive and print back in lowercase.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_output_format_case_insensitive(
            name in prop::sample::select(vec!["table", "json", "quiet"]),
            upper in prop::collection::vec(any::<bool>(), 5),
        ) {
            let mixed: String = name
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                .collect();

            let format = OutputFormat::from_str(&mixed).unwrap();
            prop_assert_eq!(format.to_string(), name);
        }
    }

    // Probe JSON is always valid and reports the midpoint as half the duration.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_probe_json_midpoint(
            duration in 0.01f64..100_000.0,
            width in 1u32..8_000,
            height in 1u32..8_000,
        ) {
            let meta = VideoMetadata { duration, width, height };
            let formatter = OutputFormatter::new(OutputFormat::Json, false);
            let output = formatter.format_probe(&ProbeOutput::new(Path::new("clip.mp4"), &meta));

            let json: serde_json::Value = serde_json::from_str(&output).unwrap();
            let midpoint = json["data"]["midpoint"].as_f64().unwrap();
            prop_assert!((midpoint - duration / 2.0).abs() <= duration * 1e-12);
            prop_assert_eq!(json["data"]["width"].as_u64(), Some(width as u64));
        }
    }
}
