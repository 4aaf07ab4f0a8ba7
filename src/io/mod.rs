//! Data container and ancillary file access

pub mod paths;
pub mod field_reader;
pub mod eos_grid;
pub mod coastline;

pub use paths::{output_png_name, resolve_input, resolve_input_from, DATA_DIR_ENV};
pub use field_reader::{ChannelSlice, FieldReader, FieldSelector};
pub use eos_grid::EosGridReader;
pub use coastline::{CoastlineResolution, Coastlines};
