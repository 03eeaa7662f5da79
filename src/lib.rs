//! Keyprint - On-device behavioral biometric signatures
//!
//! Keyprint turns a timestamped stream of keyboard and pointer interactions into
//! a fixed-size behavioral signature and compares two signatures to decide
//! whether they come from the same person, through a deterministic pipeline:
//! capture session → feature extraction → similarity scoring → decision.
//!
//! ## Modules
//!
//! - **Capture**: single-session event sink (key holds, pointer velocity)
//! - **Features**: timing statistics, rhythm histogram, error patterns, signature
//! - **Similarity**: per-category and overall scores between two feature vectors
//! - **Decision**: fixed-threshold accept/reject

pub mod capture;
pub mod config;
pub mod decision;
pub mod error;
pub mod features;
#[cfg(feature = "cli")]
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod similarity;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use capture::CaptureSession;
pub use decision::{is_match, MATCH_THRESHOLD};
pub use error::ComputeError;
pub use features::FeatureExtractor;
pub use pipeline::{batch_verify, enroll, extract_features, verify, verify_report};
pub use similarity::{cosine_similarity, score};
pub use types::{
    BehavioralFeatureVector, EnrolledProfile, InteractionEvent, InteractionKind,
    SimilarityMetrics, VerificationReport, VerificationResult,
};

// Schema exports
pub use schema::{InteractionAdapter, RawInteraction, SCHEMA_VERSION};

/// Keyprint version embedded in CLI and FFI output
pub const KEYPRINT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "keyprint";
