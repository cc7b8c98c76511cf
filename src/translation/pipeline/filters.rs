//! 文本过滤器模块
//!
//! 判断一段文本是否值得翻译：长度足够并且以拉丁字母为主。

use crate::translation::config::constants;

/// 判断是否为英文内容
///
/// ASCII 字母占全部字符的比例必须严格大于 0.5，空文本不算英文。
pub fn is_english_content(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let latin = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    latin as f64 / total as f64 > constants::ENGLISH_RATIO_THRESHOLD
}

/// 判断修剪后的文本是否为翻译候选
pub fn is_translation_candidate(text: &str, min_text_length: usize) -> bool {
    text.chars().count() >= min_text_length && is_english_content(text)
}

/// 文本过滤器
///
/// 保存当前生效的最小长度，设置更新后立即生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFilter {
    min_text_length: usize,
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(constants::MIN_TEXT_LENGTH)
    }
}

impl TextFilter {
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        is_translation_candidate(text.trim(), self.min_text_length)
    }

    pub fn min_text_length(&self) -> usize {
        self.min_text_length
    }

    pub fn set_min_text_length(&mut self, min_text_length: usize) {
        self.min_text_length = min_text_length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_english_sentence() {
        assert!(is_translation_candidate("Hello world, this is a test.", 10));
    }

    #[test]
    fn test_rejects_short_text() {
        assert!(!is_translation_candidate("Hello", 10));
        assert!(is_translation_candidate("Hello", 5));
    }

    #[test]
    fn test_ratio_boundary_is_exclusive() {
        // 5 个字母 + 5 个数字，比例正好 0.5
        assert!(!is_english_content("abcde12345"));
        assert!(is_english_content("abcdef1234"));
    }

    #[test]
    fn test_rejects_chinese_and_numbers() {
        assert!(!is_translation_candidate("你好世界，这是一个测试句子。", 5));
        assert!(!is_translation_candidate("1234567890 12345", 5));
        assert!(!is_english_content(""));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 9 个字符但字节数更多
        assert!(!is_translation_candidate("abcdefgh\u{e9}", 10));
    }

    #[test]
    fn test_filter_trims_and_tracks_setting() {
        let mut filter = TextFilter::default();
        assert!(!filter.should_translate("   Short one   "));
        filter.set_min_text_length(5);
        assert!(filter.should_translate("   Short one   "));
        assert_eq!(filter.min_text_length(), 5);
    }
}
