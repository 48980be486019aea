pub mod features;
pub mod gradient;
pub mod luminance;
pub mod overlay;
pub mod overlay_patch;
pub mod pixel;
pub mod pixel_buffer;
pub mod recommendation;
pub mod region;
pub mod statistics;
pub mod utils;
