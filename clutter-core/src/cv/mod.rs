pub mod connected;

pub use connected::connected_components;
