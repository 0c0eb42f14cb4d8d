mod literal;
mod reader;
mod schema;

pub use literal::Literal;

pub use reader::Config;
pub use reader::parse_task;

pub use schema::AugmentConfig;
pub use schema::BenchmarkConfig;
pub use schema::ImageType;
pub use schema::Layers;
pub use schema::Task;
pub use schema::TaskConfig;
pub use schema::TrainConfig;
