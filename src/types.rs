use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One of the three dataset partitions a label row is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Train,
    Validation,
    Test,
}

impl Partition {
    /// All partitions in report order.
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Validation, Partition::Test];

    /// Map a usage tag from the label file to its partition.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Training" => Some(Partition::Train),
            "PublicTest" => Some(Partition::Validation),
            "PrivateTest" => Some(Partition::Test),
            _ => None,
        }
    }

    /// The usage tag as it appears in the label file.
    pub const fn tag(&self) -> &'static str {
        match self {
            Partition::Train => "Training",
            Partition::Validation => "PublicTest",
            Partition::Test => "PrivateTest",
        }
    }

    /// Column heading used in the summary table.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Partition::Train => "Train",
            Partition::Validation => "Val",
            Partition::Test => "Test",
        }
    }

    /// Folder holding this partition's images and `label.csv`.
    pub const fn folder_name(&self) -> &'static str {
        match self {
            Partition::Train => "FER2013Train",
            Partition::Validation => "FER2013Valid",
            Partition::Test => "FER2013Test",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered category names. The last two entries are always the special
/// "unknown" and "not-a-face" categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySchema {
    names: Vec<String>,
}

impl TryFrom<Vec<String>> for CategorySchema {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<CategorySchema> for Vec<String> {
    fn from(schema: CategorySchema) -> Self {
        schema.names
    }
}

impl CategorySchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.len() < 2 {
            return Err(Error::InvalidSchema(format!(
                "need at least 2 categories (unknown and not-a-face), got {}",
                names.len()
            )));
        }
        Ok(Self { names })
    }

    /// The FER+ category list.
    pub fn ferplus() -> Self {
        let names = [
            "neutral",
            "happiness",
            "surprise",
            "sadness",
            "anger",
            "disgust",
            "fear",
            "contempt",
            "unknown",
            "NF",
        ];
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of the "unknown" category.
    pub fn unknown_index(&self) -> usize {
        self.names.len() - 2
    }

    /// Number of real emotion categories (everything before the specials).
    pub fn emotion_count(&self) -> usize {
        self.names.len() - 2
    }

    pub fn is_special(&self, index: usize) -> bool {
        index >= self.emotion_count()
    }
}

/// A distilled label: one probability per category, summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDistribution {
    probs: Vec<f64>,
}

impl LabelDistribution {
    pub fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// The distribution assigned to unusable rows: all mass on "unknown".
    pub fn unknown(size: usize) -> Self {
        debug_assert!(size >= 2);
        let mut probs = vec![0.0; size];
        probs[size - 2] = 1.0;
        Self { probs }
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    pub fn sum(&self) -> f64 {
        self.probs.iter().sum()
    }

    /// Index of the largest probability; the first one wins on ties.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = i;
            }
        }
        best
    }

    /// Number of categories carrying any weight.
    pub fn support_size(&self) -> usize {
        self.probs.iter().filter(|&&p| p > 0.0).count()
    }

    pub fn is_unknown_fallback(&self) -> bool {
        self.probs.len() >= 2 && *self == Self::unknown(self.probs.len())
    }
}

impl std::ops::Index<usize> for LabelDistribution {
    type Output = f64;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.probs[idx]
    }
}

/// A single row of the label file after distillation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// Image file name, when the source carries an image column.
    pub locator: Option<String>,
    /// Raw vote counts as read from the source.
    pub votes: Vec<f64>,
    pub distribution: LabelDistribution,
}
