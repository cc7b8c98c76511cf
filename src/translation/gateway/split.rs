//! 模型回复拆分
//!
//! 多段文本以 `---` 分隔发送，回复按同样的分隔符拆分。数量不符时依次尝试
//! 按空行、按句末标点拆分，最后截断或补空。这一步只是尽力而为，
//! 可能出现错位或空译文。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

fn paragraph_regex() -> &'static Regex {
    static PARAGRAPH: OnceLock<Regex> = OnceLock::new();
    PARAGRAPH.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph pattern"))
}

/// 将模型回复拆成 `expected` 段
pub fn split_translations(content: &str, expected: usize) -> Vec<String> {
    match expected {
        0 => Vec::new(),
        1 => vec![content.trim().to_string()],
        _ => {
            let parts: Vec<String> = content
                .split(constants::SEGMENT_SEPARATOR)
                .map(|part| part.trim().to_string())
                .collect();

            if parts.len() == expected {
                parts
            } else {
                smart_split(content, expected)
            }
        }
    }
}

/// 数量不符时的启发式拆分
///
/// 结果长度总是等于 `expected`。
pub fn smart_split(content: &str, expected: usize) -> Vec<String> {
    if expected == 0 {
        return Vec::new();
    }

    let paragraphs: Vec<String> = paragraph_regex()
        .split(content)
        .map(|part| part.trim().to_string())
        .collect();

    if paragraphs.len() == expected {
        return paragraphs;
    }

    let mut parts = split_sentences(content);

    if parts.len() > expected {
        let per_slot = parts.len() / expected;
        let mut grouped = Vec::with_capacity(expected);
        for i in 0..expected {
            let start = i * per_slot;
            let end = if i == expected - 1 {
                parts.len()
            } else {
                (i + 1) * per_slot
            };
            grouped.push(parts[start..end].join(" "));
        }
        return grouped;
    }

    parts.resize(expected, String::new());
    parts
}

/// 在句末标点之后切分
///
/// ASCII `.!?` 需要后跟空白；全角 `。！？` 直接切分。
fn split_sentences(content: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let boundary = match c {
            '.' | '!' | '?' => chars.peek().map(|n| n.is_whitespace()).unwrap_or(false),
            '。' | '！' | '？' => true,
            _ => false,
        };

        if boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
            while chars.peek().map(|n| n.is_whitespace()).unwrap_or(false) {
                chars.next();
            }
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_separator() {
        assert_eq!(split_translations("A---B---C", 3), vec!["A", "B", "C"]);
        assert_eq!(
            split_translations("甲\n---\n乙\n---\n丙", 3),
            vec!["甲", "乙", "丙"]
        );
    }

    #[test]
    fn test_single_input_keeps_whole_reply() {
        assert_eq!(split_translations("  A---B  ", 1), vec!["A---B"]);
        assert!(split_translations("anything", 0).is_empty());
    }

    #[test]
    fn test_two_chunks_for_three_inputs_pads() {
        let out = split_translations("第一段。\n\n第二段。", 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "第一段。");
        assert_eq!(out[1], "第二段。");
        assert_eq!(out[2], "");
    }

    #[test]
    fn test_paragraph_split_when_separator_missing() {
        let out = split_translations("一\n\n二\n  \n三", 3);
        assert_eq!(out, vec!["一", "二", "三"]);
    }

    #[test]
    fn test_sentence_split_groups_extra_parts() {
        let out = smart_split("One. Two. Three. Four. Five.", 2);
        assert_eq!(out, vec!["One. Two.", "Three. Four. Five."]);
    }

    #[test]
    fn test_sentence_split_handles_full_width_punctuation() {
        let out = smart_split("你好。世界！再见？", 3);
        assert_eq!(out, vec!["你好。", "世界！", "再见？"]);
    }

    #[test]
    fn test_smart_split_always_matches_expected_len() {
        for expected in 1..6 {
            assert_eq!(smart_split("a", expected).len(), expected);
            assert_eq!(smart_split("A. B. C. D. E. F. G.", expected).len(), expected);
        }
    }
}
