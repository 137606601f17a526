//! Prelude module for `retina_core`.
//!
//! This module provides a convenient way to import commonly used types and functions.
//!
//! # Examples
//!
//! ```no_run
//! use retina_core::prelude::*;
//!
//! let cfa = GrayImage::new(640, 480);
//! let recovered = Demosaicer::new(&cfa).recover();
//! ```

// Pixel buffer types
#[doc(inline)]
pub use crate::image::{
	// Buffers
	BitImage,
	GrayImage,
	RgbImage,

	// Component indexing
	RGB_COMPONENTS,
	RgbComponent,

	// Metrics
	Metrics,
	calculate_metrics,
	calculate_metrics_cropped,
	luma,
	to_gray,
};

// Engines
#[doc(inline)]
pub use crate::vng::Demosaicer;

#[doc(inline)]
pub use crate::fractal::{BlockMapping, Compressor, Decompressor, FractalError, Orientation};

#[doc(inline)]
pub use crate::binarize::{BinarizationMode, Binarizer};

// Bilevel TIFF output
#[doc(inline)]
pub use crate::tiff::save_bilevel;
