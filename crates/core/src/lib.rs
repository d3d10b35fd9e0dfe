//! Readable-content extraction and paged document rendering.
//!
//! [`Extractor`] fetches a page and returns its title and main body as a
//! cleaned HTML fragment. [`Paginator`] lays such a fragment out, captures it
//! as one bitmap and slices it into fixed-size pages.

pub mod error;
pub mod extract;
pub mod extractor;
pub mod fetch;
pub mod paginate;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod result;
pub mod testing;

pub use error::{FolioError, Result, Stage};
pub use extract::{ContentSource, ExtractConfig, ExtractConfigBuilder, ExtractedContent, TitleRule, TitleSource};
pub use extract::{resolve_content, resolve_title};
pub use extractor::{Extractor, extract};
pub use fetch::{FetchConfig, FetchedDocument, HttpFetcher, ReqwestFetcher, validate_url};
pub use paginate::{
    CommandCapture, CommandCaptureConfig, PageConfig, PageFragment, PageSize, PageWriter, PaginatedDocument,
    Paginator, PdfWriter, RasterCapture, document_file_name,
};
pub use parse::Document;
#[doc(hidden)]
pub use postprocess::PostProcessConfig;
pub use postprocess::postprocess_html;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use result::{ExtractionResult, OutputFormat};
