//! 资料库索引服务 - 业务能力层
//!
//! 只负责"维护资料库索引"能力：
//! - 扫描目录中的 PDF，按内容哈希判断是否需要重新索引
//! - 调用出题引擎推断书籍结构并持久化
//! - 按章节页码范围重新提取正文
//! - 把外部 PDF 复制进资料库

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::{PageExtractor, TextGenerator};
use crate::config::Config;
use crate::error::FileError;
use crate::models::{BookSummary, IndexEntry, LibraryIndex};
use crate::services::ExamEngine;
use crate::utils::{read_json_or_default, sha256_file, write_json_atomic};

/// 模型未给出学科时使用
const UNKNOWN_SUBJECT: &str = "Unknown";

/// 资料库索引服务
pub struct Librarian<G, E> {
    engine: Arc<ExamEngine<G>>,
    extractor: E,
    library_dir: PathBuf,
    index_path: PathBuf,
    toc_pages: u32,
}

impl<G: TextGenerator, E: PageExtractor> Librarian<G, E> {
    pub fn new(engine: Arc<ExamEngine<G>>, extractor: E, config: &Config) -> Self {
        Self {
            engine,
            extractor,
            library_dir: config.library_dir.clone(),
            index_path: config.index_file.clone(),
            toc_pages: config.toc_pages.max(1),
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    /// 读取当前索引；文件缺失或损坏时为空索引
    pub async fn load_index(&self) -> LibraryIndex {
        read_json_or_default(&self.index_path).await
    }

    async fn save_index(&self, index: &LibraryIndex) -> Result<(), FileError> {
        write_json_atomic(&self.index_path, index).await
    }

    /// 扫描资料库目录，返回本次扫描的日志行
    ///
    /// 单个文件的任何失败只记录日志，不中断扫描。
    pub async fn scan(&self) -> Vec<String> {
        let mut logs = Vec::new();

        if !self.library_dir.exists() {
            match tokio::fs::create_dir_all(&self.library_dir).await {
                Ok(()) => logs.push(format!("📁 已创建资料库目录 {}", self.library_dir.display())),
                Err(e) => logs.push(format!("❌ 无法创建资料库目录 {}: {}", self.library_dir.display(), e)),
            }
            return logs;
        }

        let files = match self.list_pdfs().await {
            Ok(files) => files,
            Err(e) => {
                logs.push(format!("❌ {}", e));
                return logs;
            }
        };

        let mut index = self.load_index().await;

        let present: BTreeSet<&String> = files.iter().map(|(name, _)| name).collect();
        let removed: Vec<String> = index
            .files
            .keys()
            .filter(|name| !present.contains(name))
            .cloned()
            .collect();
        if !removed.is_empty() {
            for name in &removed {
                index.files.remove(name);
                logs.push(format!("🗑️ 已移除: {}", name));
            }
            if let Err(e) = self.save_index(&index).await {
                logs.push(format!("❌ 保存索引失败: {}", e));
            }
        }

        for (filename, path) in &files {
            let hash = match sha256_file(path).await {
                Ok(hash) => hash,
                Err(e) => {
                    logs.push(format!("⚠️ 跳过无法读取的文件 {}: {}", filename, e));
                    continue;
                }
            };

            if index.files.get(filename).is_some_and(|entry| entry.hash == hash) {
                debug!("{} 未变化，跳过", filename);
                continue;
            }

            info!("🔍 正在分析 {} 的目录结构...", filename);
            match self.index_file(filename, path, hash).await {
                Ok(entry) => {
                    logs.push(format!(
                        "✅ 已索引 {} ({}, {} 章)",
                        filename,
                        entry.subject,
                        entry.chapters.len()
                    ));
                    index.files.insert(filename.clone(), entry);
                    if let Err(e) = self.save_index(&index).await {
                        logs.push(format!("❌ 保存索引失败: {}", e));
                    }
                }
                Err(reason) => logs.push(format!("❌ 索引 {} 失败: {}", filename, reason)),
            }
        }

        logs
    }

    /// 列出目录中的 PDF（扩展名不区分大小写），按文件名排序
    async fn list_pdfs(&self) -> Result<Vec<(String, PathBuf)>, FileError> {
        let dir = self.library_dir.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.library_dir)
            .await
            .map_err(|e| FileError::read(dir.clone(), e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FileError::read(dir.clone(), e))?
        {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf || !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push((name.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }

    /// 提取目录页并推断结构
    async fn index_file(&self, filename: &str, path: &Path, hash: String) -> Result<IndexEntry, String> {
        let toc_text = self
            .extractor
            .extract_pages(path, 1, Some(self.toc_pages))
            .map_err(|e| e.to_string())?;

        let structure = self
            .engine
            .analyze_structure(&toc_text, filename)
            .await
            .map_err(|e| e.to_string())?;

        let subject = structure
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());

        Ok(IndexEntry {
            hash,
            subject,
            chapters: structure.chapters,
            path: path.display().to_string(),
        })
    }

    /// 按学科分组的书籍列表
    pub async fn structure(&self) -> BTreeMap<String, Vec<BookSummary>> {
        self.load_index().await.grouped_by_subject()
    }

    /// 把 PDF 复制进资料库，见 [`add_to_library`]
    pub async fn add_files(&self, paths: &[PathBuf]) -> Vec<String> {
        add_to_library(&self.library_dir, paths).await
    }

    /// 重新从磁盘提取某一章的正文
    pub async fn chapter_content(&self, filename: &str, chapter_index: u32) -> Option<String> {
        let index = self.load_index().await;
        let Some(entry) = index.files.get(filename) else {
            warn!("资料库中没有 {}", filename);
            return None;
        };
        let Some(chapter) = entry.chapter(chapter_index) else {
            warn!("{} 中没有第 {} 章", filename, chapter_index);
            return None;
        };

        let (start, end) = chapter.page_range();
        match self.extractor.extract_pages(Path::new(&entry.path), start, end) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("{} 第 {} 章没有可提取的文本", filename, chapter_index);
                None
            }
            Err(e) => {
                warn!("读取 {} 第 {} 章失败: {}", filename, chapter_index, e);
                None
            }
        }
    }
}

/// 把 PDF 复制进资料库目录，返回每个文件的处理日志
///
/// 目录不存在时先创建；非 PDF 文件被拒绝，资料库中已有同名文件时跳过。
/// 复制后的文件在下一次扫描时索引。
pub async fn add_to_library(library_dir: &Path, paths: &[PathBuf]) -> Vec<String> {
    let mut logs = Vec::new();

    if let Err(e) = tokio::fs::create_dir_all(library_dir).await {
        logs.push(format!("❌ 无法创建资料库目录 {}: {}", library_dir.display(), e));
        return logs;
    }

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            logs.push(format!("⚠️ 无效的文件路径: {}", path.display()));
            continue;
        };
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            logs.push(format!("⚠️ 不是 PDF，已拒绝: {}", name));
            continue;
        }

        let target = library_dir.join(name);
        if target.exists() {
            debug!("{} 已在资料库中", name);
            logs.push(format!("⏭️ 已存在，跳过: {}", name));
            continue;
        }

        match tokio::fs::copy(path, &target).await {
            Ok(bytes) => {
                info!("📥 已加入资料库: {} ({} bytes)", name, bytes);
                logs.push(format!("📥 已加入资料库: {}", name));
            }
            Err(e) => logs.push(format!("❌ 复制 {} 失败: {}", name, e)),
        }
    }

    logs
}
