// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use clutter_data::indices::write_indices;
use image::{GrayImage, ImageBuffer, Luma};
use predicates::prelude::*;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("CLUTTER_TEST_CLI_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("config.ini");
    std::fs::write(&path, text).unwrap();
    path
}

fn clutter() -> Command {
    Command::cargo_bin("clutter").unwrap()
}

/// Write an image with one bright square and the matching label image
fn write_scene(image_dir: &Path, mask_dir: &Path, name: &str) {
    std::fs::create_dir_all(image_dir).unwrap();
    std::fs::create_dir_all(mask_dir).unwrap();

    let mut pixels = vec![20u8; 64];
    let mut labels = vec![0u16; 64];
    for y in 2..5 {
        for x in 2..5 {
            pixels[y * 8 + x] = 230;
            labels[y * 8 + x] = 1;
        }
    }

    GrayImage::from_raw(8, 8, pixels)
        .unwrap()
        .save(image_dir.join(name))
        .unwrap();

    let mask: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(8, 8, labels).unwrap();
    mask.save(mask_dir.join(name)).unwrap();
}

#[test]
fn test_requires_config_flag() {
    clutter()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn test_missing_config_file() {
    clutter()
        .args(["--config", "does_not_exist.ini"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("NoFileError"));
}

#[test]
fn test_unknown_task_fails_loudly() {
    let dir = scratch("UNKNOWN");
    let config = write_config(&dir, "[GENERAL]\ntask = 'evaluate'\n\n[EVALUATE]\nx = 1\n");

    clutter()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("UnknownTaskError"))
        .stderr(predicate::str::contains("EVALUATE"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unquoted_task_fails() {
    let dir = scratch("UNQUOTED");
    let config = write_config(
        &dir,
        "[GENERAL]\ntask = augment\n\n[AUGMENT]\nimg_dir = 'in'\nout_dir = 'out'\nnum_imgs = 1\n",
    );

    clutter()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("LiteralError"));

    assert!(!dir.join("out").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_augment_end_to_end() {
    let dir = scratch("AUGMENT");
    let images = dir.join("in");
    write_scene(&images, &dir.join("unused"), "scene_a.png");
    write_scene(&images, &dir.join("unused"), "scene_b.png");

    let text = format!(
        "[GENERAL]\ntask = 'Augment'\n\n[AUGMENT]\nimg_dir = '{}'\nout_dir = '{}'\nnum_imgs = 2\nnoise_std = 0.05\nflip_probability = 0.5\nseed = 3\n",
        images.display(),
        dir.join("out").display()
    );
    let config = write_config(&dir, &text);

    clutter()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("AUGMENT"));

    assert!(dir.join("out").join("scene_a.png").is_file());
    assert!(dir.join("out").join("scene_b.png").is_file());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_train_then_benchmark() {
    let dir = scratch("PIPELINE");

    let sim = dir.join("sim");
    for index in 0..3 {
        let name = format!("image_{:06}.png", index);
        write_scene(&sim.join("depth_ims"), &sim.join("modal_segmasks"), &name);
    }
    write_indices(sim.join("train_indices.npy"), &[0, 1]).unwrap();
    write_indices(sim.join("test_indices.npy"), &[2]).unwrap();

    let models = dir.join("models");
    let text = format!(
        "[GENERAL]\ntask = 'train'\nverbose = False\n\n[TRAIN]\nbase_path = '{}'\nmean_pixel = [128.0]\nimg_type = 'depth'\nmodel_dir = '{}'\nepochs = 2\n",
        sim.display(),
        models.display()
    );
    let config = write_config(&dir, &text);

    clutter().arg("--config").arg(&config).assert().success();

    let weights = models.join("clutter_model.safetensors");
    assert!(weights.is_file());
    assert!(models.join("clutter_model.json").is_file());
    assert!(models.join("clutter_model_losses.tsv").is_file());

    let real = dir.join("real");
    write_scene(&real.join("depth_ims"), &real.join("modal_segmasks"), "kitchen.png");

    let text = format!(
        "[GENERAL]\ntask = 'benchmark'\nverbose = False\n\n[BENCHMARK]\noutput_dir = '{}'\nrun_name = 'first'\nmodel_path = '{}'\ntest_dir = '{}'\n",
        dir.join("runs").display(),
        weights.display(),
        real.display()
    );
    let config = write_config(&dir, &text);

    // Reusing a run name must not fail
    for _ in 0..2 {
        clutter().arg("--config").arg(&config).assert().success();
    }

    let run_dir = dir.join("runs").join("first");
    assert!(run_dir.join("config.json").is_file());
    assert!(run_dir.join("coco").join("summary.json").is_file());
    assert!(run_dir.join("coco").join("per_image.tsv").is_file());
    assert!(run_dir.join("saurabh").join("pr_curve.tsv").is_file());
    assert!(run_dir.join("saurabh").join("summary.json").is_file());

    std::fs::remove_dir_all(&dir).unwrap();
}
