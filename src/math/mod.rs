//! Fixed-point math: wad/ray arithmetic, percentages, exponentials and interest.

pub mod common;
pub mod exp;
pub mod interest;
pub mod percentage;
pub mod ray;
pub mod wad;
pub mod wad_ray;

pub use common::{TryAdd, TryDiv, TryMul, TrySub};
pub use percentage::{percent_div, percent_mul};
pub use ray::Ray;
pub use wad::Wad;
pub use wad_ray::{ray_div, ray_mul, wad_div, wad_mul};
