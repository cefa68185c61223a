//! Stopword stripping by part of speech / 基于词性的停用词过滤
//!
//! The language is resolved once from the script of the text, then the matching
//! [`PosTagger`] tokenizes, tags and decides which tags carry content.

use super::tokenizer::{contains_cjk, is_single_byte, ChineseTagger, EnglishTagger, VietnameseTagger};

/// Languages the sanitizer knows how to tag / 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Primary language, any text representable in a single-byte encoding
    English,
    /// Secondary language, non single-byte text without CJK ideographs
    Vietnamese,
    Chinese,
}

impl Language {
    /// Detect the language from the script of the text / 根据文字检测语言
    pub fn detect(text: &str) -> Self {
        if is_single_byte(text) {
            Language::English
        } else if contains_cjk(text) {
            Language::Chinese
        } else {
            Language::Vietnamese
        }
    }

    pub fn tagger(self) -> &'static dyn PosTagger {
        match self {
            Language::English => &EnglishTagger,
            Language::Vietnamese => &VietnameseTagger,
            Language::Chinese => &ChineseTagger,
        }
    }
}

/// A token and its part-of-speech tag / 词及其词性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// Tokenizer + tagger for one language / 单一语言的分词与标注
pub trait PosTagger: Send + Sync {
    fn language(&self) -> Language;

    /// Split text into tokens / 分词
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Tag tokens, one [`TaggedToken`] per input token / 词性标注
    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken>;

    /// Whether a tag belongs to the content-bearing allow-list / 是否保留该词性
    fn keeps(&self, tag: &str) -> bool;
}

/// Strip low-information words from text / 去除低信息量词
///
/// Returns the original text when every token would be stripped. Tokens holding a
/// backslash escape are query syntax and always kept.
pub fn sanitize(text: &str) -> String {
    sanitize_with(text, Language::detect(text).tagger())
}

/// Strip low-information words using a specific tagger / 使用指定标注器过滤
pub fn sanitize_with(text: &str, tagger: &dyn PosTagger) -> String {
    let tokens = tagger.tokenize(text);
    let kept: Vec<String> = tagger
        .tag(&tokens)
        .into_iter()
        .filter(|token| token.word.contains('\\') || tagger.keeps(&token.tag))
        .map(|token| token.word)
        .collect();

    if kept.is_empty() {
        tracing::debug!(
            "Sanitizing stripped every token ({:?}), keeping original: {}",
            tagger.language(),
            text
        );
        return text.to_string();
    }

    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(Language::detect("deep learning for images"), Language::English);
        assert_eq!(Language::detect("Nguyễn Văn A"), Language::Vietnamese);
        assert_eq!(Language::detect("机器学习"), Language::Chinese);
    }

    #[test]
    fn test_sanitize_english() {
        assert_eq!(
            sanitize("the history of the Vietnamese language"),
            "history Vietnamese language"
        );
    }

    #[test]
    fn test_sanitize_keeps_numbers() {
        assert_eq!(sanitize("economy in 1986"), "economy 1986");
    }

    #[test]
    fn test_sanitize_keeps_decimals() {
        assert_eq!(sanitize("version 2.5 release"), "version 2.5 release");
        assert_eq!(sanitize("growth of 1,000 firms"), "growth 1,000 firms");
    }

    #[test]
    fn test_sanitize_keeps_escapes() {
        assert_eq!(sanitize(r"a\:b c"), r"a\:b c");
        assert_eq!(sanitize(r"the C\+\+ of \(Hanoi\)"), r"C\+\+ \(Hanoi\)");
        assert_eq!(sanitize(r"of \!"), r"\!");
    }

    #[test]
    fn test_sanitize_never_empty() {
        assert_eq!(sanitize("but to and"), "but to and");
        assert_eq!(sanitize("của và các"), "của và các");
    }

    #[test]
    fn test_sanitize_vietnamese() {
        assert_eq!(
            sanitize("ảnh hưởng của biến đổi khí hậu và nông nghiệp"),
            "ảnh hưởng biến đổi khí hậu nông nghiệp"
        );
    }

    #[test]
    fn test_sanitize_with_explicit_tagger() {
        // Same text forced through the Vietnamese tagger: ascii words become FW
        assert_eq!(
            sanitize_with("machine learning", Language::Vietnamese.tagger()),
            "machine learning"
        );
    }
}
