#![allow(non_snake_case)]

mod engine;
mod error;
mod midi_importer;
mod model;
mod player;
mod sheet_parser;
mod util;

pub use engine::*;
pub use error::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::mappings::*;
pub use model::song::*;
pub use player::*;
pub use sheet_parser::*;
pub use util::*;
