// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::PathBuf;

use dirs::home_dir;

use clutter_core::constant::MODEL_DIR_ENV;

/// Directory where trained weights are written when a task does not set one
pub fn get_model_dir() -> PathBuf {
    if let Ok(model_dir) = std::env::var(MODEL_DIR_ENV) {
        if !model_dir.is_empty() {
            return PathBuf::from(model_dir);
        }
    }

    if let Some(home) = home_dir() {
        return home.join(".clutter").join("models");
    }

    PathBuf::from(".clutter/models")
}

pub mod data;
pub mod indices;
