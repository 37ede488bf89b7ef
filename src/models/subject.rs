/// 模拟考试覆盖的科目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    /// 古代与中世纪史
    AncientMedievalHistory,
    /// 近代印度史
    ModernHistory,
    /// 政体与治理
    Polity,
    /// 经济
    Economy,
    /// 地理
    Geography,
    /// 环境与生态
    Environment,
    /// 科学技术
    ScienceTech,
    /// 时事
    CurrentEvents,
}

impl Subject {
    /// 模拟考试的固定科目顺序，余数题目分给排在前面的科目
    pub const MOCK_TEST: [Subject; 8] = [
        Subject::AncientMedievalHistory,
        Subject::ModernHistory,
        Subject::Polity,
        Subject::Economy,
        Subject::Geography,
        Subject::Environment,
        Subject::ScienceTech,
        Subject::CurrentEvents,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::AncientMedievalHistory => "Ancient & Medieval History",
            Subject::ModernHistory => "Modern Indian History",
            Subject::Polity => "Indian Polity & Governance",
            Subject::Economy => "Indian Economy",
            Subject::Geography => "Geography (Physical & Indian)",
            Subject::Environment => "Environment & Ecology",
            Subject::ScienceTech => "Science & Technology",
            Subject::CurrentEvents => "Current Events (Last 12 Months)",
        }
    }

    /// 作为出题主题时的写法
    pub fn topic(self) -> String {
        format!("{} (UPSC Prelims focus)", self.name())
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
