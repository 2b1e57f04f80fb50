//! Utility functions for the cascade.

pub mod image;

pub use image::load_image;
