//! XML rendering and filesystem persistence for exported documents.
//!
//! [`XmlCodec`] implements the engine's `DocumentCodec` interface over
//! `quick-xml`, and [`FileSink`] implements `ArtifactSink` over the local
//! filesystem. Together they turn an export's two nested documents into
//! `.ecore`/`.xmi`-style files on disk.

mod artifact;
mod error;
mod writer;

pub use artifact::FileSink;
pub use error::{Result, XmlError};
pub use writer::XmlCodec;
