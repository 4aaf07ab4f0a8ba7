//! Map rendering of corrected fields

pub mod colormap;
pub mod figure;
pub mod projection;
pub mod text;

pub use colormap::{Colormap, ColormapName, Normalize};
pub use figure::{render_figure, save_png, FigureInputs, Graticule, Layout, RenderSpec};
pub use projection::{MapExtent, MapProjection};
pub use text::TextRenderer;
