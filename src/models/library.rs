use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 无学科信息的书籍归入此分组
pub const UNCATEGORIZED: &str = "Uncategorized";

/// 书中的一章（由模型根据目录推断）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub index: u32,
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_page_start", deserialize_with = "deserialize_page")]
    pub page_start: u32,
    #[serde(default, deserialize_with = "deserialize_page")]
    pub page_end: u32,
}

fn default_page_start() -> u32 {
    1
}

impl Chapter {
    /// 计算实际读取的页码范围（1-based，闭区间）
    ///
    /// `page_end < page_start` 时视为模型推断错误，读取 `page_start..=page_start + 10`；
    /// `page_end == 0` 表示读到文件末尾。
    pub fn page_range(&self) -> (u32, Option<u32>) {
        let start = self.page_start.max(1);
        match self.page_end {
            0 => (start, None),
            end if end < start => (start, Some(start.saturating_add(10))),
            end => (start, Some(end)),
        }
    }
}

/// 模型推断的页码可能是整数、数字字符串或 null
fn deserialize_page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct PageVisitor;

    impl<'de> Visitor<'de> for PageVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a page number as integer, string or null")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).unwrap_or(0))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(u32::try_from(value).unwrap_or(0))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_finite() && value >= 0.0 {
                Ok(value as u32)
            } else {
                Ok(0)
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().parse().unwrap_or(0))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(0)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(PageVisitor)
}

/// 索引中的单个文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// 最近一次成功索引时的内容哈希
    pub hash: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    pub path: String,
}

impl IndexEntry {
    pub fn chapter(&self, index: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.index == index)
    }
}

/// 资料库索引文件的完整内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryIndex {
    #[serde(default)]
    pub files: BTreeMap<String, IndexEntry>,
}

impl LibraryIndex {
    /// 按学科分组；学科为空的书归入 [`UNCATEGORIZED`]
    pub fn grouped_by_subject(self) -> BTreeMap<String, Vec<BookSummary>> {
        let mut grouped: BTreeMap<String, Vec<BookSummary>> = BTreeMap::new();
        for (filename, entry) in self.files {
            let subject = if entry.subject.trim().is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                entry.subject
            };
            grouped.entry(subject).or_default().push(BookSummary {
                filename,
                path: entry.path,
                chapters: entry.chapters,
            });
        }
        grouped
    }
}

/// 模型返回的书籍结构
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookStructure {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl BookStructure {
    /// 章节序号必须从 1 开始且在同一本书内唯一
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for chapter in &self.chapters {
            if chapter.index == 0 {
                return Err(format!("章节 '{}' 的序号为 0", chapter.title));
            }
            if !seen.insert(chapter.index) {
                return Err(format!("章节序号 {} 重复", chapter.index));
            }
        }
        Ok(())
    }
}

/// 按学科分组展示时的一本书
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub filename: String,
    pub path: String,
    pub chapters: Vec<Chapter>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapter(start: u32, end: u32) -> Chapter {
        Chapter {
            index: 1,
            title: "Federalism".to_string(),
            topics: vec![],
            page_start: start,
            page_end: end,
        }
    }

    #[test]
    fn test_page_range_normal() {
        assert_eq!(chapter(12, 30).page_range(), (12, Some(30)));
    }

    #[test]
    fn test_page_range_inverted_falls_back() {
        assert_eq!(chapter(40, 12).page_range(), (40, Some(50)));
    }

    #[test]
    fn test_page_range_inverted_near_max_saturates() {
        let c: Chapter = serde_json::from_value(json!({
            "index": 1,
            "title": "Appendix",
            "page_start": 4294967295u64,
            "page_end": 3
        }))
        .unwrap();
        assert_eq!(c.page_range(), (u32::MAX, Some(u32::MAX)));
    }

    #[test]
    fn test_page_range_open_end() {
        assert_eq!(chapter(5, 0).page_range(), (5, None));
        assert_eq!(chapter(0, 0).page_range(), (1, None));
    }

    #[test]
    fn test_chapter_lenient_pages() {
        let c: Chapter = serde_json::from_value(json!({
            "index": 3,
            "title": "Parliament",
            "page_start": "45",
            "page_end": null
        }))
        .unwrap();
        assert_eq!(c.page_start, 45);
        assert_eq!(c.page_end, 0);
        assert!(c.topics.is_empty());

        let missing: Chapter =
            serde_json::from_value(json!({"index": 1, "title": "Intro"})).unwrap();
        assert_eq!(missing.page_start, 1);
        assert_eq!(missing.page_end, 0);
    }

    #[test]
    fn test_index_file_format() {
        let raw = json!({
            "files": {
                "polity.pdf": {
                    "hash": "abc",
                    "subject": "Indian Polity",
                    "chapters": [{"index": 1, "title": "Preamble", "topics": ["Sovereign"], "page_start": 3, "page_end": 9}],
                    "path": "library/polity.pdf"
                }
            }
        });
        let index: LibraryIndex = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(index.files["polity.pdf"].chapters[0].title, "Preamble");
        assert_eq!(serde_json::to_value(&index).unwrap(), raw);
    }

    fn structure(indices: &[u32]) -> BookStructure {
        let chapters = indices
            .iter()
            .map(|&index| json!({"index": index, "title": format!("Chapter {}", index)}))
            .collect::<Vec<_>>();
        serde_json::from_value(json!({"subject": "Economy", "chapters": chapters})).unwrap()
    }

    #[test]
    fn test_structure_validate() {
        assert!(structure(&[1, 2, 3]).validate().is_ok());
        assert!(structure(&[]).validate().is_ok());
        assert!(structure(&[0, 1]).validate().unwrap_err().contains("序号为 0"));
        assert!(structure(&[1, 2, 2]).validate().unwrap_err().contains("重复"));
        assert!(structure(&[0, 1, 1]).validate().is_err());
    }

    #[test]
    fn test_grouped_by_subject() {
        let index: LibraryIndex = serde_json::from_value(json!({
            "files": {
                "laxmikanth.pdf": {"hash": "a", "subject": "Indian Polity", "path": "library/laxmikanth.pdf"},
                "spectrum.pdf": {"hash": "b", "subject": "Indian Polity", "path": "library/spectrum.pdf"},
                "misc.pdf": {"hash": "c", "subject": " ", "path": "library/misc.pdf"}
            }
        }))
        .unwrap();
        let grouped = index.grouped_by_subject();
        assert_eq!(grouped.len(), 2);
        let polity: Vec<_> = grouped["Indian Polity"].iter().map(|b| b.filename.as_str()).collect();
        assert_eq!(polity, vec!["laxmikanth.pdf", "spectrum.pdf"]);
        assert_eq!(grouped[UNCATEGORIZED][0].path, "library/misc.pdf");
        assert!(LibraryIndex::default().grouped_by_subject().is_empty());
    }
}
