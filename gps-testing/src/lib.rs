mod render;
mod source;
mod track;

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use prelude::*;
pub use render::{format_reading, history_table};
pub use source::ReplaySource;
pub use track::{Track, TrackStep};
