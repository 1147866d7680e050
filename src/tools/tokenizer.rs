//! 关键词匹配
//!
//! 输入切成小写词集合：含 CJK 时用 jieba 搜索引擎模式，否则按空白切分并去掉首尾标点。
//! 英文关键词按整词命中；CJK 关键词按子串命中，jieba 切出的粒度不一定与关键词一致。

use std::collections::HashSet;
use std::sync::OnceLock;

use jieba_rs::Jieba;

static JIEBA: OnceLock<Jieba> = OnceLock::new();

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{30FF}'
    )
}

fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// 小写词集合；单字符英文词丢弃
fn token_set(text: &str) -> HashSet<String> {
    if contains_cjk(text) {
        JIEBA
            .get_or_init(Jieba::new)
            .cut_for_search(text, true)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s.len() > 1 || s.chars().next().is_some_and(is_cjk))
            .collect()
    } else {
        text.split_whitespace()
            .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|s| s.len() > 1)
            .collect()
    }
}

/// 对一段输入预先分词，之后可反复判断关键词是否命中
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    tokens: HashSet<String>,
    lowered: String,
}

impl KeywordMatcher {
    pub fn new(text: &str) -> Self {
        let text = text.trim();
        Self {
            tokens: token_set(text),
            lowered: text.to_lowercase(),
        }
    }

    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        if contains_cjk(&keyword) {
            self.lowered.contains(&keyword)
        } else {
            self.tokens.contains(&keyword)
        }
    }

    /// 命中的关键词个数
    pub fn count_hits<S: AsRef<str>>(&self, keywords: &[S]) -> usize {
        keywords.iter().filter(|k| self.matches(k.as_ref())).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_keywords_match_whole_words() {
        let m = KeywordMatcher::new("Should I buy Rust, or Go?");
        assert!(m.matches("rust"));
        assert!(m.matches("GO"));
        assert!(!m.matches("ru"));
        assert!(!m.matches("i"));
    }

    #[test]
    fn test_cjk_keywords_match_by_substring() {
        let m = KeywordMatcher::new("我想了解基金投资的风险");
        assert!(m.matches("基金"));
        assert!(m.matches("基金投资"));
        assert!(!m.matches("股票"));
    }

    #[test]
    fn test_count_hits_and_empty_keyword() {
        let m = KeywordMatcher::new("rust compiler error 编译失败");
        assert_eq!(m.count_hits(&["rust", "compiler", "编译", "python"]), 3);
        assert!(!m.matches("  "));
        assert_eq!(KeywordMatcher::new("").count_hits(&["rust"]), 0);
    }
}
