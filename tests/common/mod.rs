#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bsort::split::SplitPaths;

/// Images for all four categories, three per category.
pub const TWELVE_IMAGES: [&str; 12] = [
    "aaa_b2_1.jpg",
    "aaa_b2_2.jpg",
    "aaa_b2_3.jpg",
    "bbb_b3_1.jpg",
    "bbb_b3_2.jpg",
    "bbb_b3_3.jpg",
    "ccc_b4_1.jpg",
    "ccc_b4_2.jpg",
    "ccc_b4_3.jpg",
    "ddd_b5_1.jpg",
    "ddd_b5_2.jpg",
    "ddd_b5_3.jpg",
];

/// Write dummy images into `root/images` and matching labels into
/// `root/labels`. Names ending in `_nolabel.jpg` get no label.
pub fn create_dataset(root: &Path, images: &[&str]) -> (PathBuf, PathBuf) {
    let image_dir = root.join("images");
    let label_dir = root.join("labels");
    fs::create_dir_all(&image_dir).expect("create image dir");
    fs::create_dir_all(&label_dir).expect("create label dir");

    for image in images {
        fs::write(image_dir.join(image), "img").expect("write image");
        if !image.ends_with("_nolabel.jpg") {
            let label = Path::new(image).with_extension("txt");
            fs::write(label_dir.join(label), "0 0.5 0.5 0.2 0.2\n").expect("write label");
        }
    }

    (image_dir, label_dir)
}

/// Destination layout under `root/out`.
pub fn split_paths(root: &Path) -> SplitPaths {
    SplitPaths {
        image_dir: root.join("images"),
        label_dir: root.join("labels"),
        train_images: root.join("out/train/images"),
        val_images: root.join("out/val/images"),
        train_labels: root.join("out/train/labels"),
        val_labels: root.join("out/val/labels"),
    }
}

/// Sorted names of files in `dir` with extension `ext`.
pub fn files_with_ext(dir: &Path, ext: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ext))
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// File stems of `names`, in order.
pub fn stems(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| Some(Path::new(name).file_stem()?.to_str()?.to_string()))
        .collect()
}
