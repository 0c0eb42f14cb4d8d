// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// Section holding the task selector and global options
pub const GENERAL_SECTION: &str = "GENERAL";

// Section whose keys are inherited by every other section
pub const DEFAULT_SECTION: &str = "DEFAULT";

// Key in the general section selecting the task
pub const TASK_KEY: &str = "task";

// Key in the general section toggling console output
pub const VERBOSE_KEY: &str = "verbose";

// Extension of images read by the augment task and the real test set
pub const PNG_EXTENSION: &str = "png";

// The currently supported common image formats
pub const IMAGE_DYNAMIC_FORMATS: [&str; 12] = [
    "bmp", "jpeg", "jpg", "png", "pbm", "pgm", "ppm", "qoi", "tga", "tif", "tiff", "webp",
];

// Dataset splits used when training
pub const TRAIN_SPLIT: &str = "train";
pub const VALIDATION_SPLIT: &str = "test";

// Subdirectory holding instance label images
pub const SEGMASK_DIR: &str = "modal_segmasks";

// Environment variable overriding the default model directory
pub const MODEL_DIR_ENV: &str = "CLUTTER_MODEL_DIR";

// Weights and hyperparameter file names written by the train task
pub const MODEL_WEIGHTS_FILE: &str = "clutter_model.safetensors";
pub const MODEL_CONFIG_EXTENSION: &str = "json";
pub const MODEL_LOSSES_FILE: &str = "clutter_model_losses.tsv";

// Devices a model can be placed on
pub const DEVICES: [&str; 3] = ["cpu", "cuda", "metal"];
pub const DEFAULT_DEVICE: &str = "cpu";

// Default training length when the section does not override it
pub const DEFAULT_EPOCHS: usize = 100;

// IoU thresholds for COCO-style averaging (0.50:0.05:0.95)
pub const COCO_IOU_THRESHOLDS: [f32; 10] = [0.5, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95];

// Number of recall points used for interpolated average precision
pub const COCO_RECALL_POINTS: usize = 101;

// Score thresholds swept by the pixel-weighted precision/recall benchmark
pub const SAURABH_SCORE_STEPS: usize = 21;
pub const SAURABH_MATCH_IOU: f32 = 0.5;
