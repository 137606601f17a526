//! This crate provides the three image-processing engines of the `retina-rs` project,
//! together with the pixel-buffer types they share.
//!
//! # Engines
//!
//! - **VNG**: Variable Number of Gradients demosaicing of Bayer-mosaic CFA images
//! - **Fractal**: fixed-size grayscale compression as an iterated function system
//!   of contractive range-to-domain block mappings, and the matching decompressor
//! - **Binarize**: adaptive 1-bit thresholding over min/max/mean image pyramids
//!
//! Engines are independent of each other and of any file format; they consume and
//! produce owned pixel buffers. File I/O lives with the callers, except for the
//! bilevel TIFF writer in [`tiff`], which exists because no external collaborator
//! covers CCITT Group 3 output.
//!
//! # Examples
//!
//! ```rust
//! use retina_core::prelude::*;
//!
//! let gray = GrayImage::new(256, 256);
//! let stream = Compressor::new(&gray, 8, false).compress();
//! let restored = Decompressor::from_bytes(&stream).unwrap().decompress(8, 42);
//! assert_eq!(restored.width(), 256);
//! ```

pub mod binarize;
pub mod fractal;
pub mod image;
pub mod prelude;
pub mod tiff;
pub mod vng;

// Re-export commonly used types at crate root for convenience
pub use binarize::{BinarizationMode, Binarizer};
pub use fractal::{BlockMapping, Compressor, Decompressor, FractalError, Orientation};
pub use image::{BitImage, GrayImage, Metrics, RgbComponent, RgbImage};
pub use vng::Demosaicer;
