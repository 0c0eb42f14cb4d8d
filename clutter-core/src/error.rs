// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ClutterError {
    ConfigReadError(String),
    ConfigSectionError(String),
    ConfigKeyError(String, String),
    LiteralError(String, String),
    SchemaError(String),
    UnknownTaskError(String),
    ImageReadError(String),
    ImageWriteError(String),
    ImageExtensionError,
    ImageSizeError,
    MaskError(&'static str),
    MaskReadError(String),
    DatasetError(String),
    ModelError(String),
    BenchmarkError(String),
    TableWriteError(String),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for ClutterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClutterError::ConfigReadError(message) => {
                write!(
                    f,
                    "[clutter::ConfigReadError] Configuration could not be read. {}",
                    message
                )
            }
            ClutterError::ConfigSectionError(section) => {
                write!(
                    f,
                    "[clutter::ConfigSectionError] Configuration is missing section [{}].",
                    section
                )
            }
            ClutterError::ConfigKeyError(section, key) => {
                write!(
                    f,
                    "[clutter::ConfigKeyError] Configuration section [{}] is missing key '{}'.",
                    section, key
                )
            }
            ClutterError::LiteralError(key, message) => {
                write!(
                    f,
                    "[clutter::LiteralError] Value of '{}' is not a valid literal. {}",
                    key, message
                )
            }
            ClutterError::SchemaError(message) => {
                write!(
                    f,
                    "[clutter::SchemaError] Task configuration is invalid. {}.",
                    message
                )
            }
            ClutterError::UnknownTaskError(task) => {
                write!(
                    f,
                    "[clutter::UnknownTaskError] Task '{}' is not one of: AUGMENT, TRAIN, BENCHMARK.",
                    task
                )
            }
            ClutterError::ImageReadError(path) => {
                write!(f, "[clutter::ImageReadError] Failed to read image {}.", path)
            }
            ClutterError::ImageWriteError(path) => {
                write!(
                    f,
                    "[clutter::ImageWriteError] Failed to write image {}.",
                    path
                )
            }
            ClutterError::ImageExtensionError => {
                write!(
                    f,
                    "[clutter::ImageExtensionError] Could not detect a valid image extension for input."
                )
            }
            ClutterError::ImageSizeError => {
                write!(
                    f,
                    "[clutter::ImageSizeError] The buffer does not match provided image size."
                )
            }
            ClutterError::MaskError(message) => {
                write!(f, "[clutter::MaskError] Failed to create mask. {}", message)
            }
            ClutterError::MaskReadError(path) => {
                write!(f, "[clutter::MaskReadError] Failed to read mask {}.", path)
            }
            ClutterError::DatasetError(message) => {
                write!(
                    f,
                    "[clutter::DatasetError] Dataset could not be prepared. {}.",
                    message
                )
            }
            ClutterError::ModelError(message) => {
                write!(f, "[clutter::ModelError] {}.", message)
            }
            ClutterError::BenchmarkError(message) => {
                write!(f, "[clutter::BenchmarkError] {}.", message)
            }
            ClutterError::TableWriteError(message) => {
                write!(
                    f,
                    "[clutter::TableWriteError] Failed to write table. {}.",
                    message
                )
            }
            ClutterError::NoFileError(message) => {
                write!(
                    f,
                    "[clutter::NoFileError] File could not be found. {}.",
                    message
                )
            }
            ClutterError::DirError(message) => {
                write!(
                    f,
                    "[clutter::DirError] Directory could not be read or created. {}.",
                    message
                )
            }
            ClutterError::OtherError(message) => {
                write!(f, "[clutter::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for ClutterError {}
