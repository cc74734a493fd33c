pub mod completion;
pub mod pdf_extractor;
mod pdf_objects;
pub mod preview;
pub mod summarizer;

pub use completion::{CompletionClient, GroqClient};
pub use pdf_extractor::{join_pages, ExtractedText, PdfExtractor};
pub use preview::{PagePreview, PreviewRenderer};
pub use summarizer::SummaryService;
