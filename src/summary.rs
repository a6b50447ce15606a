//! Per-partition majority counts.
//!
//! Every distilled label is reduced to its arg-max category and counted, which
//! gives a quick view of the class balance of each partition.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::loader::LabelSet;
use crate::types::{LabelDistribution, Partition};

/// Count how many labels have each category as their majority.
///
/// Every distribution must have exactly `category_count` entries.
pub fn tally<'a, I>(category_count: usize, distributions: I) -> Result<Vec<usize>>
where
    I: IntoIterator<Item = &'a LabelDistribution>,
{
    let mut counts = vec![0; category_count];
    for dist in distributions {
        if dist.len() != category_count {
            return Err(Error::InvalidSchema(format!(
                "label has {} categories, expected {category_count}",
                dist.len()
            )));
        }
        counts[dist.argmax()] += 1;
    }
    Ok(counts)
}

/// Render the summary table: a header row naming the partitions, then one
/// tab-separated row per category.
pub fn render_summary(
    category_names: &[String],
    train: &[usize],
    validation: &[usize],
    test: &[usize],
) -> Result<String> {
    for (partition, counts) in Partition::ALL.iter().zip([train, validation, test]) {
        if counts.len() != category_names.len() {
            return Err(Error::InvalidSchema(format!(
                "{partition} tally has {} entries for {} categories",
                counts.len(),
                category_names.len()
            )));
        }
    }

    let mut s = String::new();

    s.push_str(&format!(
        "{:<10}\t{}\t{}\t{}\n",
        "",
        Partition::Train.display_name(),
        Partition::Validation.display_name(),
        Partition::Test.display_name()
    ));

    for (i, name) in category_names.iter().enumerate() {
        s.push_str(&format!(
            "{:<10}\t{}\t{}\t{}\n",
            name, train[i], validation[i], test[i]
        ));
    }

    Ok(s)
}

/// Majority counts of a label set, serializable for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub categories: Vec<String>,
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl Summary {
    pub fn from_label_set(labels: &LabelSet) -> Result<Self> {
        let count = labels.categories().len();
        Ok(Self {
            categories: labels.categories().names().to_vec(),
            train: tally(count, labels.distributions(Partition::Train))?,
            validation: tally(count, labels.distributions(Partition::Validation))?,
            test: tally(count, labels.distributions(Partition::Test))?,
        })
    }

    pub fn counts(&self, partition: Partition) -> &[usize] {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.validation,
            Partition::Test => &self.test,
        }
    }

    pub fn render(&self) -> Result<String> {
        render_summary(&self.categories, &self.train, &self.validation, &self.test)
    }
}
