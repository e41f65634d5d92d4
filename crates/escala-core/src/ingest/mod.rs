mod command;
mod format;
mod names;
mod ocr;
mod pdf;
mod pipeline;
mod text;

pub use format::DocumentFormat;
pub use names::{
    NameExtractor, RankToken, RankVocabulary, DEFAULT_STOP_WORDS, MILITARY_RANKS, MIN_NAME_CHARS,
};
pub use ocr::TesseractOcr;
pub use pdf::{PdfTextLayer, PlainTextFile};
pub use pipeline::{RosterOutput, RosterPipeline};
pub use text::{
    content_chars, ContentThreshold, Degradation, ExtractedText, ExtractionError,
    ExtractionMethod, ExtractionResult, TextExtractor, TextStrategy, MIN_CONTENT_CHARS,
    PAGE_SEPARATOR,
};
