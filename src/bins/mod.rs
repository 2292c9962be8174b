mod classify;
mod palette;
mod threshold;

pub use classify::classify;
pub use palette::{named_palette, Palette, NO_DATA_COLOR};
pub use threshold::{generate, ThresholdMode, ThresholdSet};
