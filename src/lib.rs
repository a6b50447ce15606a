//! # ferplus-labels
//!
//! Turns crowd-sourced FER+ emotion votes into per-image training labels.
//!
//! This crate provides:
//! - **Loading**: parse the FER+ label CSV and route each row into the
//!   train / validation / test partition named by its usage tag
//! - **Distillation**: collapse a row of vote counts into a soft label
//!   distribution, or the fixed "unknown" label when the votes disagree too much
//! - **Summary**: per-partition counts of each majority emotion
//! - **Targets**: training targets for the majority, probability,
//!   cross-entropy and multi-target training modes
//!
//! ## Distillation Overview
//!
//! 1. Drop single votes as noise
//! 2. Take the top-voted categories (ties together) until they cover 75% of
//!    the votes, at most three categories
//! 3. "unknown" or "not-a-face" only wins when it is the sole top category
//! 4. Keep the label only if it explains more than half of the votes,
//!    then normalize it to sum to one
//!
//! ## Quick Start
//!
//! ```rust
//! use ferplus_labels::{load_labels_from_reader, Partition, Summary};
//!
//! let source = "\
//! Usage,neutral,happiness,surprise,sadness,anger,disgust,fear,contempt,unknown,NF
//! Training,4,6,0,0,0,0,0,0,0,0
//! PublicTest,0,0,0,0,0,0,0,0,0,10
//! PrivateTest,1,1,1,0,0,0,0,0,1,0
//! ";
//!
//! let labels = load_labels_from_reader(source.as_bytes()).unwrap();
//! let train = &labels.partition(Partition::Train)[0];
//! assert_eq!(train.distribution.argmax(), 1);
//!
//! // all single votes: labelled unknown
//! let test = &labels.partition(Partition::Test)[0];
//! assert!(test.distribution.is_unknown_fallback());
//!
//! print!("{}", Summary::from_label_set(&labels)?.render()?);
//! # Ok::<(), ferplus_labels::Error>(())
//! ```
//!
//! ## Distilling A Single Row
//!
//! ```rust
//! use ferplus_labels::distill;
//!
//! let label = distill(&[6.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 10).unwrap();
//! assert_eq!(label[0], 0.6);
//! assert_eq!(label[1], 0.4);
//! ```

pub mod config;
mod distill;
mod error;
pub mod export;
mod loader;
mod summary;
pub mod targets;
mod types;

pub use config::Config;
pub use distill::{distill, Distillation, DistillConfig, Distiller, FallbackReason, Outcome};
pub use error::{Error, Result};
pub use export::{export_partitions, ExportFormat};
pub use loader::{
    load_labels, load_labels_from_reader, DegeneratePolicy, LabelLoader, LabelSet, LoaderOptions,
};
pub use summary::{render_summary, tally, Summary};
pub use targets::{is_trainable, training_target, TrainingMode};
pub use types::{CategorySchema, LabelDistribution, LabeledImage, Partition};
