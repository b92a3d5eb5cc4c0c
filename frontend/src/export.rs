use futures::future::LocalBoxFuture;
use thiserror::Error;

pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";
pub const FALLBACK_FILENAME: &str = "summary.md";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("not supported by this browser")]
    Unsupported,
    #[error("the browser refused the operation")]
    Rejected,
    #[error("{0}")]
    Js(String),
}

pub trait Clipboard {
    fn write_text<'a>(&'a self, text: &'a str) -> LocalBoxFuture<'a, Result<(), ExportError>>;
}

pub trait FileSaver {
    fn save(&self, filename: &str, mime: &str, contents: &str) -> Result<(), ExportError>;
}

pub fn download_filename(video_id: &str) -> String {
    let stem = video_id.trim();
    if stem.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{stem}.md")
    }
}
