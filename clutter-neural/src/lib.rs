// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod bench;
pub mod config;
pub mod device;
pub mod model;
pub mod net;
pub mod preprocess;
pub mod real;
