//! Service modules for the review & reward flow
//!
//! - Upload validation and screenshot preprocessing
//! - OCR boundary and the rating rule tables
//! - Classifier, flow controller and background classification
//! - In-memory session registry

pub mod classification_task;
pub mod flow_controller;
pub mod image_preprocessor;
pub mod input_validator;
pub mod ocr_engine;
pub mod rating_rules;
pub mod screenshot_classifier;
pub mod session_registry;

pub use classification_task::spawn_classification;
pub use flow_controller::{
    begin_upload, finish_classification, FlowController, UploadAdmission, UploadOutcome,
    PROCESSING_FAILED_MESSAGE,
};
pub use image_preprocessor::{preprocess_image, PreparedImage, PreprocessError};
pub use input_validator::{validate_image_file, ValidationError, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES};
pub use ocr_engine::{OcrEngine, OcrError, OcrOutput, ProgressCallback, TesseractCli};
pub use rating_rules::detect_rating;
pub use screenshot_classifier::{classify_text, ClassifierError, ReviewClassifier, ScreenshotClassifier};
pub use session_registry::{spawn_idle_sweeper, SessionRegistry, SWEEP_INTERVAL};
