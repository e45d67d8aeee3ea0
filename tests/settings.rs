use std::io::Write;
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use vision_guard::config::{
    Settings, CONFIG_ENV, MOTION_THRESHOLD_ENV, PROCESSING_HEIGHT_ENV, PROCESSING_WIDTH_ENV,
    SAMPLE_STRIDE_ENV,
};
use vision_guard::MotionConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        CONFIG_ENV,
        SAMPLE_STRIDE_ENV,
        MOTION_THRESHOLD_ENV,
        PROCESSING_WIDTH_ENV,
        PROCESSING_HEIGHT_ENV,
    ] {
        std::env::remove_var(key);
    }
}

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let settings = Settings::load().expect("load defaults");
    assert_eq!(settings.detector, MotionConfig::default());
    assert_eq!(settings.detector.sample_stride, 5);
    assert_eq!(settings.detector.motion_threshold, 0.02);
    assert_eq!(settings.detector.processing_width, 640);
    assert_eq!(settings.detector.processing_height, 480);
}

#[test]
fn loads_json_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(
        ".json",
        r#"{
            "detector": {
                "sample_stride": 3,
                "motion_threshold": 0.05,
                "processing_width": 320,
                "processing_height": 240,
                "pixel_delta_threshold": 30
            }
        }"#,
    );
    std::env::set_var(CONFIG_ENV, file.path());
    std::env::set_var(SAMPLE_STRIDE_ENV, "10");
    std::env::set_var(PROCESSING_HEIGHT_ENV, "  ");

    let settings = Settings::load().expect("load config");
    assert_eq!(settings.detector.sample_stride, 10);
    assert_eq!(settings.detector.motion_threshold, 0.05);
    assert_eq!(settings.detector.processing_width, 320);
    assert_eq!(settings.detector.processing_height, 240);
    assert_eq!(settings.detector.pixel_delta_threshold, 30);
    assert_eq!(settings.detector.blur_kernel_size, 21);

    clear_env();
}

#[test]
fn loads_toml_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(
        ".toml",
        r#"
[detector]
sample_stride = 2
blur_kernel_size = 11
dilation_iterations = 1
"#,
    );
    std::env::set_var(CONFIG_ENV, file.path());
    std::env::set_var(MOTION_THRESHOLD_ENV, "0.1");

    let settings = Settings::load().expect("load config");
    assert_eq!(settings.detector.sample_stride, 2);
    assert_eq!(settings.detector.blur_kernel_size, 11);
    assert_eq!(settings.detector.dilation_iterations, 1);
    assert_eq!(settings.detector.motion_threshold, 0.1);

    clear_env();
}

#[test]
fn rejects_unknown_fields() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = config_file(".json", r#"{ "detector": { "stride": 3 } }"#);
    std::env::set_var(CONFIG_ENV, file.path());
    assert!(Settings::load().is_err());

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var(SAMPLE_STRIDE_ENV, "0");
    let err = Settings::load().expect_err("zero stride");
    assert!(err.to_string().contains("invalid settings"));
    clear_env();

    std::env::set_var(MOTION_THRESHOLD_ENV, "1.5");
    assert!(Settings::load().is_err());
    clear_env();

    std::env::set_var(PROCESSING_WIDTH_ENV, "wide");
    let err = Settings::load().expect_err("unparsable width");
    assert!(err.to_string().contains(PROCESSING_WIDTH_ENV));
    clear_env();

    let file = config_file(".toml", "[detector]\nblur_kernel_size = 20\n");
    std::env::set_var(CONFIG_ENV, file.path());
    assert!(Settings::load().is_err());
    clear_env();

    std::env::set_var(CONFIG_ENV, "/nonexistent/vision-guard.json");
    assert!(Settings::load().is_err());
    clear_env();
}
