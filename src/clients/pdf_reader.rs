/// PDF 文本提取
use crate::error::PdfError;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// 按页提取文本的能力
pub trait PageExtractor: Send + Sync {
    /// 提取第 `start..=end` 页（1-based）；`end` 为 `None` 时读到最后一页，超出范围的页码被截断
    fn extract_pages(&self, path: &Path, start: u32, end: Option<u32>) -> Result<String, PdfError>;
}

/// 基于 lopdf 的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PageExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path, start: u32, end: Option<u32>) -> Result<String, PdfError> {
        let doc = Document::load(path).map_err(|source| PdfError::OpenFailed {
            path: path.display().to_string(),
            source,
        })?;

        let total = doc.get_pages().len() as u32;
        let start = start.max(1);
        let end = end.map_or(total, |e| e.min(total));
        debug!("提取 {} 第 {}-{} 页 (共 {} 页)", path.display(), start, end, total);

        let mut text = String::new();
        let mut last_error = None;
        for page in start..=end {
            match doc.extract_text(&[page]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    warn!("第 {} 页文本提取失败 ({}): {}", page, path.display(), e);
                    last_error = Some(e);
                }
            }
        }

        // 所有页都失败时才视为错误
        match last_error {
            Some(source) if text.is_empty() => Err(PdfError::ExtractFailed {
                path: path.display().to_string(),
                start,
                end,
                source,
            }),
            _ => Ok(text),
        }
    }
}
