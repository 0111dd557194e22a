//! # Geometry Calculators
//!
//! Space, wall surface and opening geometry. Every function is pure and
//! resolves grid/level labels through [`crate::grid`].
//!
//! - [`space`] - grid-rectangle and polygon area/perimeter
//! - [`wall_surface`] - span length, storey height, gross/total area, validation
//! - [`opening`] - punched opening area

pub mod opening;
pub mod space;
pub mod wall_surface;

pub use opening::{compute_opening_area, Opening, OpeningGeometry};
pub use space::{
    compute_boundary_geometry, compute_grid_rect_geometry, compute_polygon_geometry, compute_space_geometry,
    ring_perimeter, shoelace_area, GridRectBoundary, Point, PolygonBoundary, Space, SpaceBoundary, SpaceGeometry,
};
pub use wall_surface::{
    compute_grid_span_length, compute_level_height, compute_wall_surface_geometry, validate_wall_surface,
    SurfaceType, ValidationResult, WallGridLine, WallSurface, WallSurfaceDraft, WallSurfaceGeometry,
};
