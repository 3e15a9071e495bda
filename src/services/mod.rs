pub mod file_service;
pub mod markdown_service;
pub mod search_index;
pub mod search_service;

pub use file_service::FileService;
pub use markdown_service::MarkdownService;
pub use search_index::SearchIndex;
pub use search_service::SearchService;
