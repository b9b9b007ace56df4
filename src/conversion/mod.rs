//! Conversion orchestration
//!
//! A request moves through these stages:
//! - validated: encoding type and loudness target checked, nothing on disk yet
//! - staged: upload written to its own scratch file
//! - transcoded (transcode only): pre-processed into an intermediate WAV
//! - encoded/decoded: final output written by the encoder
//! - responded: output streamed back to the client
//! - cleaned: every scratch file of the request deleted
//!
//! The HTTP layer covers validation, staging and responding; this module
//! runs the tools in between.

pub mod pipeline;
pub mod request;

pub use pipeline::{decode, encode, encode_request, transcode};
pub use request::{ConversionRequest, ConversionResult, StagedUpload};
