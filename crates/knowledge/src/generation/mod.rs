//! Chunk-level note generation.
//!
//! Every chunk of a source document becomes at most one vault note written
//! from the chunks nearest to it. Chunks already used as context are not
//! turned into notes again within a run.

pub mod format;
pub mod parse;
pub mod persist;
pub mod pipeline;

pub use parse::{parse_reply, GeneratedNote, ParseOutcome};
pub use pipeline::{
    run_generation, GenerationOptions, GenerationReport, NoteGenerator, UsedChunkSet,
};
