// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::ffi::OsStr;

use clutter_core::augment::Augmenter;
use clutter_core::config::AugmentConfig;
use clutter_core::constant;
use clutter_core::error::ClutterError;
use clutter_core::im::ClutterImage;
use clutter_core::ut::path::{mkdir_if_missing, read_dir_entries};
use clutter_core::ut::track::{progress_bar, progress_log};
use kdam::BarExt;

/// Augment PNG images from `img_dir` into `out_dir` under the same names
///
/// Entries are visited in directory enumeration order and the run stops
/// once `num_imgs` entries have been visited. Every entry counts toward
/// that limit, including entries that are not PNG images, so fewer than
/// `num_imgs` images may be written. Returns the number of images written.
pub fn augment_data(
    config: &AugmentConfig,
    augmenter: &mut dyn Augmenter,
    verbose: bool,
) -> Result<usize, ClutterError> {
    let out_dir = mkdir_if_missing(&config.out_dir)?;

    progress_log(
        &format!("Augmenting data in directory {}.", config.img_dir.display()),
        verbose,
    );

    let entries = read_dir_entries(&config.img_dir)?;

    let mut pb = progress_bar(config.num_imgs, "Augmenting", verbose);
    let mut written = 0;

    for entry in entries.iter().take(config.num_imgs) {
        // Extension match is case-sensitive, so `scene.PNG` is visited but skipped
        if entry.is_file() && entry.extension() == Some(OsStr::new(constant::PNG_EXTENSION)) {
            let image = ClutterImage::open(entry)?;
            let augmented = augmenter.augment(&image)?;

            let name = entry
                .file_name()
                .ok_or_else(|| ClutterError::NoFileError(entry.display().to_string()))?;

            augmented.save(out_dir.join(name))?;
            written += 1;
        }

        pb.update(1)
            .map_err(|err| ClutterError::OtherError(err.to_string()))?;
    }

    if verbose {
        println!();
    }

    progress_log(
        &format!(
            "Augmentation complete. {} images saved in {}.",
            written,
            out_dir.display()
        ),
        verbose,
    );

    Ok(written)
}
