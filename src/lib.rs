//! `retina-rs` bundles three classic image-processing cores behind one roof:
//! VNG demosaicing of Bayer mosaics, fractal coding of fixed-size grayscale
//! images, and pyramid adaptive binarization.
//!
//! The engines live in [`retina_core`]; this crate re-exports them and ships
//! the command-line front ends (`vng`, `fractal-encode`, `fractal-decode`,
//! `binarize`).

pub use retina_core::*;
