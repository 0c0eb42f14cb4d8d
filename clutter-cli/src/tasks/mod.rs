// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

pub mod augment;
pub mod benchmark;
pub mod train;

pub use augment::augment_data;
pub use benchmark::benchmark;
pub use train::train;
