pub mod geometry;
pub mod sparse_hash;

pub use geometry::Aabb;
pub use sparse_hash::SparseHashGrid;
