//! Writes distilled labels back out, one `label.csv` per partition folder.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::Result;
use crate::loader::LabelSet;
use crate::targets::{training_target, TrainingMode};
use crate::types::Partition;

/// File name written inside each partition folder.
pub const LABEL_FILE_NAME: &str = "label.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Every image with its full distilled distribution.
    Distribution,
    /// Trainable images only, with their training target over the emotions.
    Targets { mode: TrainingMode, seed: u64 },
}

/// Write `<base_dir>/<partition folder>/label.csv` for every partition.
///
/// When the labels carry image names, images without one are left out of the
/// files. Returns the paths written, in partition order.
pub fn export_partitions(
    labels: &LabelSet,
    base_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    let schema = labels.categories();
    let with_locator = labels.has_locators();
    let columns = match format {
        ExportFormat::Distribution => schema.names(),
        ExportFormat::Targets { .. } => &schema.names()[..schema.emotion_count()],
    };
    let mut rng = match format {
        ExportFormat::Targets { seed, .. } => StdRng::seed_from_u64(seed),
        ExportFormat::Distribution => StdRng::seed_from_u64(0),
    };

    let mut written = Vec::with_capacity(Partition::ALL.len());
    for partition in Partition::ALL {
        let folder = base_dir.join(partition.folder_name());
        fs::create_dir_all(&folder)?;
        let path = folder.join(LABEL_FILE_NAME);

        let mut writer = csv::Writer::from_path(&path)?;
        let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
        if with_locator {
            header.push("image");
        }
        header.extend(columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        let mut rows = 0usize;
        for image in labels.partition(partition) {
            if with_locator && image.locator.is_none() {
                continue;
            }
            let values = match format {
                ExportFormat::Distribution => image.distribution.as_slice().to_vec(),
                ExportFormat::Targets { mode, .. } => {
                    match training_target(schema, &image.distribution, mode, &mut rng) {
                        Some(target) => target,
                        None => continue,
                    }
                }
            };

            let mut record: Vec<String> = Vec::with_capacity(values.len() + 1);
            if with_locator {
                record.push(image.locator.clone().unwrap_or_default());
            }
            record.extend(values.iter().map(f64::to_string));
            writer.write_record(&record)?;
            rows += 1;
        }
        writer.flush()?;

        info!(partition = %partition, rows, path = %path.display(), "exported labels");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distill::Distiller;
    use crate::loader::{load_labels_from_reader, LabelLoader, LoaderOptions};

    const SOURCE: &str = "Usage,neutral,happiness,unknown,NF\n\
                          Training,6,4,0,0\n\
                          Training,0,0,9,0\n\
                          PrivateTest,0,10,0,0\n";

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn exports_distributions() {
        let labels = load_labels_from_reader(SOURCE.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let paths = export_partitions(&labels, dir.path(), ExportFormat::Distribution).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("FER2013Train/label.csv"));

        let train = read_rows(&paths[0]);
        assert_eq!(train[0], vec!["neutral", "happiness", "unknown", "NF"]);
        assert_eq!(train.len(), 3);
        assert_eq!(train[1], vec!["0.6", "0.4", "0", "0"]);
        assert_eq!(train[2], vec!["0", "0", "1", "0"]);

        // header only
        assert_eq!(read_rows(&paths[1]).len(), 1);
    }

    #[test]
    fn exports_targets_for_trainable_rows() {
        let labels = load_labels_from_reader(SOURCE.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let format = ExportFormat::Targets {
            mode: TrainingMode::Majority,
            seed: 1,
        };
        let paths = export_partitions(&labels, dir.path(), format).unwrap();

        let train = read_rows(&paths[0]);
        assert_eq!(train[0], vec!["neutral", "happiness"]);
        // the unknown-majority row is skipped
        assert_eq!(train.len(), 2);
        assert_eq!(train[1], vec!["1", "0"]);

        let test = read_rows(&paths[2]);
        assert_eq!(test[1], vec!["0", "1"]);
    }

    #[test]
    fn unnamed_images_are_not_exported() {
        let loader = LabelLoader::new(
            Distiller::default(),
            LoaderOptions {
                image_column: Some("Image name".into()),
                ..LoaderOptions::default()
            },
        );
        let source = "Usage,Image name,neutral,happiness,unknown,NF\n\
                      Training,fer0000000.png,4,6,0,0\n\
                      Training,,10,0,0,0\n";
        let labels = loader.load_reader(source.as_bytes()).unwrap();
        assert_eq!(labels.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let paths = export_partitions(&labels, dir.path(), ExportFormat::Distribution).unwrap();

        let train = read_rows(&paths[0]);
        assert_eq!(train.len(), 2);
        assert_eq!(train[0], vec!["image", "neutral", "happiness", "unknown", "NF"]);
        assert_eq!(train[1], vec!["fer0000000.png", "0.4", "0.6", "0", "0"]);
    }
}
