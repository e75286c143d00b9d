pub mod hit;
pub mod svg;

pub use hit::{hit_test, hit_test_rect, object_bounds};
pub use svg::render_svg;
