use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 难度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Extreme,
}

/// 界面标签与等级名称（小写）到难度的映射
static LABELS: phf::Map<&'static str, Difficulty> = phf_map! {
    "fundamental" => Difficulty::Easy,
    "applied" => Difficulty::Moderate,
    "advanced" => Difficulty::Hard,
    "upsc actual" => Difficulty::Extreme,
    "easy" => Difficulty::Easy,
    "moderate" => Difficulty::Moderate,
    "hard" => Difficulty::Hard,
    "extreme" => Difficulty::Extreme,
};

impl Difficulty {
    /// 写进提示词的等级名称
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Moderate => "Moderate",
            Difficulty::Hard => "Hard",
            Difficulty::Extreme => "Extreme",
        }
    }

    /// 界面显示的标签
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Fundamental",
            Difficulty::Moderate => "Applied",
            Difficulty::Hard => "Advanced",
            Difficulty::Extreme => "UPSC Actual",
        }
    }

    /// 从标签或等级名称解析
    pub fn from_label(s: &str) -> Option<Self> {
        LABELS.get(s.trim().to_lowercase().as_str()).copied()
    }

    /// 解析失败时回退到 Hard
    pub fn from_label_or_default(s: &str) -> Self {
        Self::from_label(s).unwrap_or(Difficulty::Hard)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Hard
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_map_to_levels() {
        assert_eq!(Difficulty::from_label("Fundamental"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_label("UPSC Actual"), Some(Difficulty::Extreme));
        assert_eq!(Difficulty::from_label("moderate"), Some(Difficulty::Moderate));
        assert_eq!(Difficulty::from_label_or_default("??"), Difficulty::Hard);
    }

    #[test]
    fn test_label_roundtrip() {
        for level in [
            Difficulty::Easy,
            Difficulty::Moderate,
            Difficulty::Hard,
            Difficulty::Extreme,
        ] {
            assert_eq!(Difficulty::from_label(level.label()), Some(level));
        }
    }
}
