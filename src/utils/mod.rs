pub mod math;
pub mod frequency;
