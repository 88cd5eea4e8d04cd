pub mod alphabet;
pub mod sequence;

pub use alphabet::Alphabet;
pub use sequence::{SeqId, SequenceTable, UniqueSequence};
