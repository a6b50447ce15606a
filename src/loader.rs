//! Loader for FER+ label files.
//!
//! The label file is a CSV whose header names the usage column followed by the
//! category names, and whose rows hold a usage tag followed by vote counts:
//!
//! ```text
//! Usage,neutral,happiness,surprise,sadness,anger,disgust,fear,contempt,unknown,NF
//! Training,4,0,0,1,3,2,0,0,0,0
//! PublicTest,10,0,0,0,0,0,0,0,0,0
//! ```
//!
//! The published file also carries an image name after the usage tag; set
//! [`LoaderOptions::image_column`] to read it.
//!
//! # Example
//!
//! ```ignore
//! use ferplus_labels::{load_labels, Partition};
//!
//! let labels = load_labels("fer2013new.csv")?;
//! println!("{} training images", labels.partition(Partition::Train).len());
//! ```
//!
//! Any malformed row aborts the whole load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::distill::{Distiller, FallbackReason, Outcome};
use crate::error::{Error, Result};
use crate::types::{CategorySchema, LabelDistribution, LabeledImage, Partition};

/// What to do with rows whose votes are all outliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Label them "unknown" like any other rejected row.
    #[default]
    Fallback,
    /// Abort the load with [`Error::DegenerateVoteRow`].
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Header name of the image column that follows the usage column, if any.
    pub image_column: Option<String>,
    pub degenerate: DegeneratePolicy,
}

/// Distilled labels routed into their partitions, in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSet {
    categories: CategorySchema,
    train: Vec<LabeledImage>,
    validation: Vec<LabeledImage>,
    test: Vec<LabeledImage>,
}

impl LabelSet {
    pub fn new(categories: CategorySchema) -> Self {
        Self {
            categories,
            train: Vec::new(),
            validation: Vec::new(),
            test: Vec::new(),
        }
    }

    /// Load a snapshot written by [`LabelSet::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let labels: Self = bincode::deserialize(&bytes)?;
        Ok(labels)
    }

    /// Save the distilled labels as a binary snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        info!(path = %path.as_ref().display(), images = self.len(), "wrote label snapshot");
        Ok(())
    }

    pub fn categories(&self) -> &CategorySchema {
        &self.categories
    }

    pub fn partition(&self, partition: Partition) -> &[LabeledImage] {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.validation,
            Partition::Test => &self.test,
        }
    }

    pub fn push(&mut self, partition: Partition, image: LabeledImage) {
        match partition {
            Partition::Train => self.train.push(image),
            Partition::Validation => self.validation.push(image),
            Partition::Test => self.test.push(image),
        }
    }

    pub fn distributions(
        &self,
        partition: Partition,
    ) -> impl Iterator<Item = &LabelDistribution> + '_ {
        self.partition(partition).iter().map(|img| &img.distribution)
    }

    /// Total number of images across all partitions.
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any image carries a locator.
    pub fn has_locators(&self) -> bool {
        Partition::ALL
            .iter()
            .any(|&p| self.partition(p).iter().any(|img| img.locator.is_some()))
    }

    /// Split into category schema and the train, validation and test collections.
    pub fn into_parts(
        self,
    ) -> (
        CategorySchema,
        Vec<LabeledImage>,
        Vec<LabeledImage>,
        Vec<LabeledImage>,
    ) {
        (self.categories, self.train, self.validation, self.test)
    }
}

/// Reads label files and distills every row on the way in.
#[derive(Debug, Clone, Default)]
pub struct LabelLoader {
    distiller: Distiller,
    options: LoaderOptions,
}

impl LabelLoader {
    pub fn new(distiller: Distiller, options: LoaderOptions) -> Self {
        Self { distiller, options }
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<LabelSet> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening label file");
        let file = File::open(path)?;
        self.load_reader(BufReader::new(file))
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<LabelSet> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = rdr.records();

        let header = records
            .next()
            .ok_or_else(|| Error::InvalidSchema("label file has no header row".into()))??;

        let first_vote_column = match &self.options.image_column {
            Some(name) => {
                if header.get(1).map(str::trim) != Some(name.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "expected image column {:?} after the usage column, found {:?}",
                        name,
                        header.get(1).unwrap_or("")
                    )));
                }
                2
            }
            None => 1,
        };
        let categories = CategorySchema::new(
            header
                .iter()
                .skip(first_vote_column)
                .map(|name| name.trim().to_string())
                .collect(),
        )?;
        let expected = first_vote_column + categories.len();

        let mut labels = LabelSet::new(categories);
        let mut fallbacks = 0usize;

        for result in records {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            if record.len() != expected {
                return Err(Error::RowLengthMismatch {
                    line,
                    expected,
                    found: record.len(),
                });
            }

            let tag = &record[0];
            let partition = Partition::from_tag(tag).ok_or_else(|| Error::InvalidPartitionTag {
                line,
                tag: tag.to_string(),
            })?;

            let locator = (first_vote_column == 2)
                .then(|| record[1].trim().to_string())
                .filter(|name| !name.is_empty());

            let votes = record
                .iter()
                .skip(first_vote_column)
                .zip(labels.categories().names())
                .map(|(value, column)| parse_vote(value, column, line))
                .collect::<Result<Vec<f64>>>()?;

            let distillation = self.distiller.distill_with_outcome(&votes)?;
            if let Outcome::Fallback(reason) = distillation.outcome {
                if reason == FallbackReason::DegenerateVotes
                    && self.options.degenerate == DegeneratePolicy::Reject
                {
                    return Err(Error::DegenerateVoteRow { line });
                }
                fallbacks += 1;
            }

            labels.push(
                partition,
                LabeledImage {
                    locator,
                    votes,
                    distribution: distillation.distribution,
                },
            );
        }

        info!(
            train = labels.train.len(),
            validation = labels.validation.len(),
            test = labels.test.len(),
            fallbacks,
            "loaded label file"
        );
        Ok(labels)
    }
}

fn parse_vote(value: &str, column: &str, line: u64) -> Result<f64> {
    let invalid = || Error::VoteParseError {
        line,
        column: column.to_string(),
        value: value.to_string(),
    };
    let vote: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !vote.is_finite() || vote < 0.0 {
        return Err(invalid());
    }
    Ok(vote)
}

/// Load and distill a label file with the default policy.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<LabelSet> {
    LabelLoader::default().load_path(path)
}

/// Load and distill label data from an already-opened reader.
pub fn load_labels_from_reader<R: Read>(reader: R) -> Result<LabelSet> {
    LabelLoader::default().load_reader(reader)
}
