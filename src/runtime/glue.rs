/// A marker placed in the content tree (and, once executed, in the output
/// stream) that suppresses surrounding whitespace and a preceding newline
/// across its position during output assembly (`output_stream.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Glue;
