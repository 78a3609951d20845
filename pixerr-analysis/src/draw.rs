//! Drawing state shared by consecutive plot calls.

use crate::error::DrawError;
use crate::plot::{Plot, PlotSink};

/// ROOT colour indices: green, orange, violet, yellow, red, blue, magenta,
/// azure, cyan and teal, first in a light then in a dark shade.
pub const PALETTE: [u16; 20] = [
    417, 801, 881, 401, 625, 601, 617, 861, 433, 841, //
    419, 809, 883, 403, 635, 603, 619, 863, 435, 843,
];

/// Owns a plot sink and the colour cycle.
///
/// Create one per output session and pass it by `&mut` to the `draw_*`
/// methods of analyses and collections.
#[derive(Debug, Default)]
pub struct DrawContext<S: PlotSink> {
    sink: S,
    color_index: usize,
    sub_dir: Option<String>,
}

impl<S: PlotSink> DrawContext<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            color_index: 0,
            sub_dir: None,
        }
    }

    /// Next palette colour, wrapping after 20.
    pub fn next_color(&mut self) -> u16 {
        let color = PALETTE[self.color_index % PALETTE.len()];
        self.color_index = (self.color_index + 1) % PALETTE.len();
        color
    }

    /// Restarts the colour cycle.
    pub fn reset(&mut self) {
        self.color_index = 0;
    }

    /// Sets the sub directory for plots that do not name one.
    pub fn set_sub_dir(&mut self, sub_dir: Option<String>) {
        self.sub_dir = sub_dir;
    }

    /// Hands a plot to the sink.
    ///
    /// # Errors
    /// Returns the sink's error.
    pub fn draw(&mut self, mut plot: Plot) -> Result<(), DrawError> {
        if plot.sub_dir.is_none() {
            plot.sub_dir.clone_from(&self.sub_dir);
        }
        self.sink.draw(plot)
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }
}
