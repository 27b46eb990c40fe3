mod chapter;
pub use chapter::*;

mod series_info;
pub use series_info::*;

mod tracking;
pub use tracking::*;

mod watermark;
pub use watermark::*;
