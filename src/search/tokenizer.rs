//! Tokenizers and part-of-speech taggers / 分词与词性标注
//!
//! One tagger per supported language / 每种语言一个标注器：
//! - English: Unicode word split + lexicon/suffix tagger emitting Penn Treebank tags
//! - Vietnamese: syllable split + function-word lexicon emitting VLSP-style tags
//! - Chinese: jieba segmentation and tagging (ICTCLAS tags)

use encoding_rs::WINDOWS_1252;
use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::sanitizer::{Language, PosTagger, TaggedToken};

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:[.,]\d+)*$").expect("number pattern is valid"));

/// Check whether text survives a round trip through Windows-1252 / 是否可用单字节编码表示
pub fn is_single_byte(text: &str) -> bool {
    let (_, _, had_errors) = WINDOWS_1252.encode(text);
    !had_errors
}

/// Check if text contains CJK characters (Chinese, Japanese, Korean) / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
            '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
            '\u{3040}'..='\u{309f}' |  // Hiragana
            '\u{30a0}'..='\u{30ff}' |  // Katakana
            '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
        )
    })
}

/// Apply `words` to the text, except that a whitespace-delimited chunk holding a
/// backslash escape is one token / 转义片段作为整体保留
fn split_keeping_escapes<F>(text: &str, words: F) -> Vec<String>
where
    F: Fn(&str) -> Vec<String>,
{
    if !text.contains('\\') {
        return words(text);
    }

    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        if chunk.contains('\\') {
            tokens.push(chunk.to_string());
        } else {
            tokens.extend(words(chunk));
        }
    }
    tokens
}

/// UAX #29 word split; `2.5`, `1,000` and `don't` stay whole / Unicode 分词
fn split_words(text: &str) -> Vec<String> {
    split_keeping_escapes(text, |chunk| {
        chunk.unicode_words().map(str::to_string).collect()
    })
}

fn is_number(word: &str) -> bool {
    NUMBER_RE.is_match(word)
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().map(char::is_uppercase).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// English
// ---------------------------------------------------------------------------

/// English tagger (Penn Treebank tags) / 英文词性标注
pub struct EnglishTagger;

const EN_KEEP: &[&str] = &[
    "NN", "NNS", "NNP", "NNPS", // nouns
    "VB", "VBG", "VBN", "VBP", "VBZ", // verbs
    "JJ", "JJR", "JJS", // adjectives
    "RB", "RBR", "RBS", // adverbs
    "CD", "FW",
];

fn english_lexicon(lower: &str) -> Option<&'static str> {
    let tag = match lower {
        "a" | "an" | "the" | "this" | "that" | "these" | "those" | "some" | "any" | "every"
        | "each" | "no" | "all" | "both" | "either" | "neither" | "another" => "DT",
        "of" | "in" | "on" | "at" | "by" | "for" | "with" | "about" | "against" | "between"
        | "into" | "through" | "during" | "before" | "after" | "above" | "below" | "from"
        | "over" | "under" | "than" | "since" | "without" | "within" | "along" | "across"
        | "behind" | "beyond" | "among" | "upon" | "via" | "per" | "because" | "if"
        | "while" | "whether" | "although" | "though" | "as" | "until" | "unless" => "IN",
        "and" | "or" | "but" | "nor" | "yet" | "so" => "CC",
        "to" => "TO",
        "i" | "me" | "you" | "he" | "him" | "she" | "it" | "we" | "us" | "they" | "them"
        | "myself" | "yourself" | "himself" | "herself" | "itself" | "ourselves"
        | "themselves" => "PRP",
        "my" | "your" | "his" | "her" | "its" | "our" | "their" => "PRP$",
        "which" => "WDT",
        "who" | "whom" | "what" => "WP",
        "whose" => "WP$",
        "when" | "where" | "why" | "how" => "WRB",
        "can" | "could" | "may" | "might" | "must" | "shall" | "should" | "will" | "would" => {
            "MD"
        }
        "there" => "EX",
        "is" | "has" | "does" => "VBZ",
        "are" | "am" | "have" | "do" => "VBP",
        "was" | "were" | "had" | "did" => "VBD",
        "be" => "VB",
        "been" => "VBN",
        "being" => "VBG",
        "not" | "very" | "also" | "too" => "RB",
        _ => return None,
    };
    Some(tag)
}

fn english_guess(word: &str, lower: &str, position: usize) -> &'static str {
    let len = lower.chars().count();
    if is_number(word) {
        "CD"
    } else if lower.ends_with("ly") && len > 4 {
        "RB"
    } else if lower.ends_with("ing") && len > 5 {
        "VBG"
    } else if lower.ends_with("ed") && len > 4 {
        "VBN"
    } else if ["ous", "ful", "ive", "able", "ible", "less", "ic"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
        && len > 4
    {
        "JJ"
    } else if position > 0 && starts_uppercase(word) {
        if lower.ends_with('s') { "NNPS" } else { "NNP" }
    } else if lower.ends_with('s') && !lower.ends_with("ss") && len > 3 {
        "NNS"
    } else {
        "NN"
    }
}

impl PosTagger for EnglishTagger {
    fn language(&self) -> Language {
        Language::English
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        split_words(text)
    }

    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .enumerate()
            .map(|(position, word)| {
                let lower = word.to_lowercase();
                let tag = english_lexicon(&lower)
                    .unwrap_or_else(|| english_guess(word, &lower, position));
                TaggedToken::new(word, tag)
            })
            .collect()
    }

    fn keeps(&self, tag: &str) -> bool {
        EN_KEEP.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Vietnamese
// ---------------------------------------------------------------------------

/// Vietnamese tagger (VLSP tags) / 越南语词性标注
pub struct VietnameseTagger;

const VI_KEEP: &[&str] = &["N", "Np", "Nc", "Nu", "V", "A", "M", "FW"];

fn vietnamese_lexicon(lower: &str) -> Option<&'static str> {
    let tag = match lower {
        "và" | "hoặc" | "nhưng" | "mà" | "hay" | "nên" | "vì" | "nếu" | "thì" => "C",
        "của" | "cho" | "trong" | "với" | "tại" | "từ" | "về" | "trên" | "dưới" | "đến"
        | "bởi" | "theo" | "qua" | "vào" | "giữa" | "ngoài" | "sau" | "trước" => "E",
        "các" | "những" | "mọi" | "mỗi" | "từng" | "mấy" => "L",
        "tôi" | "ta" | "chúng" | "nó" | "họ" | "mình" | "này" | "đó" | "kia" | "ấy" | "gì"
        | "ai" | "đây" => "P",
        "à" | "ạ" | "nhé" | "nhỉ" | "chứ" | "thôi" | "đấy" => "T",
        "đã" | "đang" | "sẽ" | "rất" | "không" | "cũng" | "vẫn" | "chỉ" | "lại" | "đều"
        | "mới" | "còn" | "quá" => "R",
        "là" | "có" => "V",
        "cái" | "con" | "chiếc" | "quyển" => "Nc",
        "tốt" | "lớn" | "nhỏ" | "cao" | "thấp" | "nhiều" | "ít" => "A",
        _ => return None,
    };
    Some(tag)
}

impl PosTagger for VietnameseTagger {
    fn language(&self) -> Language {
        Language::Vietnamese
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        split_words(text)
    }

    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .map(|word| {
                let lower = word.to_lowercase();
                let tag = if let Some(tag) = vietnamese_lexicon(&lower) {
                    tag
                } else if is_number(word) {
                    "M"
                } else if word.is_ascii() {
                    // Latin word without diacritics inside Vietnamese text
                    "FW"
                } else if starts_uppercase(word) {
                    "Np"
                } else {
                    "N"
                };
                TaggedToken::new(word, tag)
            })
            .collect()
    }

    fn keeps(&self, tag: &str) -> bool {
        VI_KEEP.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Chinese
// ---------------------------------------------------------------------------

/// Chinese tagger backed by jieba / 中文词性标注 (jieba)
pub struct ChineseTagger;

impl PosTagger for ChineseTagger {
    fn language(&self) -> Language {
        Language::Chinese
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        split_keeping_escapes(text, |chunk| {
            JIEBA
                .cut(chunk, true)
                .into_iter()
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    fn tag(&self, tokens: &[String]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .map(|word| {
                let tags = JIEBA.tag(word, true);
                let tag = match tags.as_slice() {
                    [single] => single.tag.to_string(),
                    _ => "x".to_string(),
                };
                TaggedToken::new(word, tag)
            })
            .collect()
    }

    fn keeps(&self, tag: &str) -> bool {
        // n*, v*, a* families plus adverbs, numerals, latin words
        tag.starts_with('n')
            || tag.starts_with('v')
            || tag.starts_with('a')
            || matches!(tag, "d" | "m" | "eng")
    }
}
