//! Stratified train/validation splitting.
//!
//! Images are grouped into the fixed [`Category`] buckets by the code in their
//! file name. Each bucket is sorted and split on its own: the first
//! `train_per_bucket` files go to training, the rest to validation. Images and
//! labels are copied as pairs, so every copied image has its label next to it
//! on the same side of the split.

mod report;

pub use report::{Side, SplitEvent, SplitReport};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::code::{extract_code, Category};
use crate::error::BsortError;
use crate::files::{label_name_for, list_files, IMAGE_EXTENSION};

/// Source and destination directories for a split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPaths {
    pub image_dir: PathBuf,
    pub label_dir: PathBuf,
    pub train_images: PathBuf,
    pub val_images: PathBuf,
    pub train_labels: PathBuf,
    pub val_labels: PathBuf,
}

impl SplitPaths {
    /// The four destination directories, in clean-up order.
    pub fn output_dirs(&self) -> [&Path; 4] {
        [
            &self.train_images,
            &self.val_images,
            &self.train_labels,
            &self.val_labels,
        ]
    }

    fn images_for(&self, side: Side) -> &Path {
        match side {
            Side::Train => &self.train_images,
            Side::Val => &self.val_images,
        }
    }

    fn labels_for(&self, side: Side) -> &Path {
        match side {
            Side::Train => &self.train_labels,
            Side::Val => &self.val_labels,
        }
    }
}

/// How many files of each bucket go to training.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub train_per_bucket: usize,
    /// Bucket size that does not trigger a count warning.
    pub expected_per_bucket: usize,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            train_per_bucket: 2,
            expected_per_bucket: 3,
        }
    }
}

/// Image file names grouped by category, each group sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buckets {
    groups: BTreeMap<Category, Vec<String>>,
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            groups: Category::ALL.iter().map(|&c| (c, Vec::new())).collect(),
        }
    }
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all categories in processing order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.groups.iter().map(|(c, files)| (*c, files.as_slice()))
    }

    /// Total number of files across all buckets.
    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    fn push(&mut self, category: Category, file: String) {
        self.groups.entry(category).or_default().push(file);
    }

    fn sort(&mut self) {
        for files in self.groups.values_mut() {
            files.sort();
        }
    }
}

/// Result of scanning the image directory.
#[derive(Clone, Debug)]
pub struct Categorized {
    pub buckets: Buckets,
    /// Files that could not be placed in a bucket.
    pub events: Vec<SplitEvent>,
}

/// Partition the first `train` entries of a sorted bucket into training and
/// the remainder into validation.
pub fn assign_split(files: &[String], train: usize) -> (&[String], &[String]) {
    files.split_at(train.min(files.len()))
}

/// Splits an image/label directory pair into train and validation trees.
#[derive(Clone, Debug)]
pub struct DatasetSplitter {
    paths: SplitPaths,
    policy: SplitPolicy,
}

impl DatasetSplitter {
    pub fn new(paths: SplitPaths, policy: SplitPolicy) -> Self {
        Self { paths, policy }
    }

    pub fn paths(&self) -> &SplitPaths {
        &self.paths
    }

    /// Delete and recreate the four destination directories.
    pub fn clean_output_dirs(&self) -> Result<(), BsortError> {
        for dir in self.paths.output_dirs() {
            if dir.exists() {
                fs::remove_dir_all(dir).map_err(BsortError::at(dir))?;
            }
            fs::create_dir_all(dir).map_err(BsortError::at(dir))?;
        }

        tracing::info!("output folders cleaned and recreated");
        Ok(())
    }

    /// Group the source images into category buckets.
    ///
    /// Every call scans the directory afresh and returns new buckets.
    pub fn categorize_files(&self) -> Result<Categorized, BsortError> {
        let listing = list_files(&self.paths.image_dir, IMAGE_EXTENSION)?;

        let mut buckets = Buckets::new();
        let mut events: Vec<SplitEvent> = listing
            .unreadable
            .into_iter()
            .map(|file| SplitEvent::UnreadableName { file })
            .collect();

        for name in listing.names {
            let Some(code) = extract_code(&name) else {
                tracing::warn!(file = %name, "no b-code pattern in image name");
                events.push(SplitEvent::MissingCode { file: name });
                continue;
            };

            match Category::from_code(code) {
                Some(category) => buckets.push(category, name),
                None => {
                    tracing::warn!(file = %name, %code, "b-code has no category");
                    events.push(SplitEvent::UnknownCode { file: name, code });
                }
            }
        }

        buckets.sort();
        tracing::info!(files = buckets.total(), "files categorized into buckets");

        Ok(Categorized { buckets, events })
    }

    /// Split every bucket and copy the resulting pairs.
    ///
    /// Destination directories are created if missing but not cleaned.
    pub fn split_and_copy(&self, buckets: &Buckets) -> Result<SplitReport, BsortError> {
        for dir in self.paths.output_dirs() {
            fs::create_dir_all(dir).map_err(BsortError::at(dir))?;
        }

        let mut report = SplitReport::new(self.paths.clone());

        for (category, files) in buckets.iter() {
            if files.len() != self.policy.expected_per_bucket {
                tracing::warn!(
                    %category,
                    expected = self.policy.expected_per_bucket,
                    found = files.len(),
                    "unexpected bucket size"
                );
                report.add(SplitEvent::CountMismatch {
                    category,
                    expected: self.policy.expected_per_bucket,
                    found: files.len(),
                });
            }

            let (train, val) = assign_split(files, self.policy.train_per_bucket);
            for file in train {
                report.add(self.copy_pair(category, file, Side::Train)?);
            }
            for file in val {
                report.add(self.copy_pair(category, file, Side::Val)?);
            }
        }

        tracing::info!(
            train = report.copied_count(Side::Train),
            val = report.copied_count(Side::Val),
            "stratified split completed"
        );
        Ok(report)
    }

    /// Clean, categorize, then split.
    pub fn run(&self) -> Result<SplitReport, BsortError> {
        self.clean_output_dirs()?;
        let categorized = self.categorize_files()?;
        let mut report = self.split_and_copy(&categorized.buckets)?;

        let mut events = categorized.events;
        events.append(&mut report.events);
        report.events = events;
        report.completed = true;
        Ok(report)
    }

    /// Copy the label, then the image. A missing label skips both.
    fn copy_pair(
        &self,
        category: Category,
        file: &str,
        side: Side,
    ) -> Result<SplitEvent, BsortError> {
        let label_name = label_name_for(file);
        let label_src = self.paths.label_dir.join(&label_name);

        if !label_src.is_file() {
            tracing::warn!(file, "missing label, skipping pair");
            return Ok(SplitEvent::MissingLabel {
                file: file.to_string(),
                side,
            });
        }

        let label_dst = self.paths.labels_for(side).join(&label_name);
        fs::copy(&label_src, &label_dst).map_err(BsortError::at(&label_src))?;

        let image_src = self.paths.image_dir.join(file);
        let image_dst = self.paths.images_for(side).join(file);
        fs::copy(&image_src, &image_dst).map_err(BsortError::at(&image_src))?;

        tracing::debug!(file, %category, %side, "copied pair");
        Ok(SplitEvent::Copied {
            file: file.to_string(),
            category,
            side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn splitter(root: &Path) -> DatasetSplitter {
        DatasetSplitter::new(
            SplitPaths {
                image_dir: root.join("images"),
                label_dir: root.join("labels"),
                train_images: root.join("out/train/images"),
                val_images: root.join("out/val/images"),
                train_labels: root.join("out/train/labels"),
                val_labels: root.join("out/val/labels"),
            },
            SplitPolicy::default(),
        )
    }

    fn create_dataset(root: &Path, images: &[&str]) {
        fs::create_dir_all(root.join("images")).expect("create images");
        fs::create_dir_all(root.join("labels")).expect("create labels");
        for image in images {
            fs::write(root.join("images").join(image), "img").expect("write image");
            if !image.ends_with("_nolabel.jpg") {
                fs::write(
                    root.join("labels").join(label_name_for(image)),
                    "0 0.5 0.5 0.2 0.2",
                )
                .expect("write label");
            }
        }
    }

    #[test]
    fn assign_split_takes_leading_files_for_training() {
        let three = names(&["a", "b", "c"]);
        let (train, val) = assign_split(&three, 2);
        assert_eq!(train, &three[..2]);
        assert_eq!(val, &three[2..]);

        let two = names(&["a", "b"]);
        let (train, val) = assign_split(&two, 2);
        assert_eq!(train.len(), 2);
        assert!(val.is_empty());

        let (train, val) = assign_split(&[], 2);
        assert!(train.is_empty() && val.is_empty());
    }

    #[test]
    fn buckets_always_hold_every_category() {
        let buckets = Buckets::new();
        let categories: Vec<Category> = buckets.iter().map(|(c, _)| c).collect();
        assert_eq!(categories, Category::ALL.to_vec());
        assert_eq!(buckets.total(), 0);
    }

    #[test]
    fn categorize_sorts_each_bucket() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_dataset(temp.path(), &["aaa_b2_3.jpg", "aaa_b2_1.jpg", "aaa_b2_2.jpg"]);

        let categorized = splitter(temp.path())
            .categorize_files()
            .expect("categorize");

        assert_eq!(
            categorized.buckets.get(Category::OtherB2),
            names(&["aaa_b2_1.jpg", "aaa_b2_2.jpg", "aaa_b2_3.jpg"]).as_slice()
        );
        assert!(categorized.events.is_empty());
    }

    #[test]
    fn categorize_twice_does_not_accumulate() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_dataset(temp.path(), &["aaa_b4_1.jpg", "aaa_b4_2.jpg"]);
        let splitter = splitter(temp.path());

        let first = splitter.categorize_files().expect("first pass");
        let second = splitter.categorize_files().expect("second pass");
        assert_eq!(first.buckets, second.buckets);
        assert_eq!(second.buckets.get(Category::LightblueB4).len(), 2);
    }

    #[test]
    fn copy_pair_skips_image_when_label_missing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_dataset(temp.path(), &["aaa_b2_1_nolabel.jpg"]);
        let splitter = splitter(temp.path());
        splitter.clean_output_dirs().expect("clean");

        let event = splitter
            .copy_pair(Category::OtherB2, "aaa_b2_1_nolabel.jpg", Side::Train)
            .expect("copy pair");

        assert!(matches!(event, SplitEvent::MissingLabel { side: Side::Train, .. }));
        assert!(!temp
            .path()
            .join("out/train/images/aaa_b2_1_nolabel.jpg")
            .exists());
    }

    #[test]
    fn split_without_categorize_copies_nothing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        create_dataset(temp.path(), &["aaa_b2_1.jpg"]);
        let splitter = splitter(temp.path());

        let report = splitter.split_and_copy(&Buckets::new()).expect("split");
        assert_eq!(report.copied_count(Side::Train), 0);
        assert_eq!(report.copied_count(Side::Val), 0);
        assert_eq!(report.warning_count(), 4);
    }
}
