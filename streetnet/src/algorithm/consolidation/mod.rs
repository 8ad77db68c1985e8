mod consolidate_ops;
mod union_find;

pub use consolidate_ops::consolidate_intersections;
