//! Constants shared across the cascade.

/// Number of standard ECG leads.
pub const LEAD_COUNT: usize = 12;

/// Canonical physiological lead order.
pub const LEAD_NAMES: [&str; LEAD_COUNT] = [
    "I", "II", "III", "aVR", "aVL", "aVF", "V1", "V2", "V3", "V4", "V5", "V6",
];

/// Default number of samples per digitized lead.
pub const DEFAULT_TARGET_LENGTH: usize = 1000;

/// Side length of the square image fed to the validator and the binary screen.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// ImageNet channel means (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Binary screen probability at or above which an image is routed to the multi-label stage.
pub const DEFAULT_ABNORMAL_THRESHOLD: f32 = 0.4;

/// Validator probability at or above which an image is accepted as an ECG.
pub const DEFAULT_VALIDATION_THRESHOLD: f32 = 0.5;

/// Validator probability reported when no validator model is installed.
pub const DEFAULT_MISSING_VALIDATOR_CONFIDENCE: f32 = 0.95;

/// Validator probability reported when the validator fails on an image.
pub const DEFAULT_VALIDATOR_ERROR_CONFIDENCE: f32 = 0.90;

/// Per-class decision threshold used when no threshold table entry is configured.
pub const DEFAULT_CLASS_THRESHOLD: f32 = 0.5;

/// Default disease categories, in canonical order.
pub const DEFAULT_CLASS_NAMES: [&str; 5] = ["NORM", "MI", "HYP", "STTC", "CD"];

/// Label emitted by the binary screen for normal images.
pub const NORMAL_LABEL: &str = "NORMAL";

/// Label emitted when no class passes its threshold.
pub const ABNORMAL_SENTINEL_LABEL: &str = "ABNORMAL";

/// Largest image file accepted by default (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Decimal places for probabilities in result records.
pub const PROBABILITY_DECIMALS: i32 = 3;

/// Decimal places for percentages in result records.
pub const PERCENT_DECIMALS: i32 = 2;
