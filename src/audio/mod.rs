pub mod assembler;
pub mod buffer;
pub mod silence;

pub use assembler::assemble;
pub use buffer::AudioBuffer;
pub use silence::{detect_spans, DEFAULT_MIN_SILENCE_MS};
