//! Call transcripts
//!
//! `TranscriptRecorder` is the in-memory turn log of one call, and
//! `TranscriptStore` persists it once the call is over.

mod recorder;
mod store;

pub use recorder::{
    CallMetadata, CallTranscript, Speaker, TranscriptMetadata, TranscriptRecorder, Turn,
};
pub use store::{JsonTranscriptStore, TranscriptStore};
