//! # photo_share
//!
//! The data half of the photo session: an ordered gallery of image-data
//! URIs with a wrapping cursor, conversion of picked files into those
//! URIs, and resolution of a shared photo set from a remote endpoint with
//! a local-store fallback.
//!
//! Everything here is synchronous; the application runs the slow parts
//! (file reads, the share lookup) on worker threads and applies results
//! from its main loop.

pub mod gallery;
pub mod share;
pub mod upload;

pub use gallery::{Direction, Gallery};
pub use share::{ShareError, ShareRecord, ShareStore};
pub use upload::{decode_data_uri, encode_photos, UploadError};
