//! Address resolution for spoken pickup and destination fields
//!
//! Wraps two interchangeable geocoding backends behind one resolver that
//! applies the exchange's precision gate and bounding-box policy, plus the
//! override shortcuts that skip the network entirely (city-centre phrases,
//! the Athens airport).

pub mod normalize;
pub mod overrides;
pub mod resolver;

pub use resolver::{GeoBackend, GeoPolicy, GeoResolver};
