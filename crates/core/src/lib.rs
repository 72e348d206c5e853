//! Per-frame facial landmark extraction.
//!
//! Each bounded context splits into `domain` (types and traits) and
//! `infrastructure` (ffmpeg, ONNX Runtime, JSON adapters). [`pipeline`]
//! wires them into the extraction use case.

pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod tracking;
pub mod video;
