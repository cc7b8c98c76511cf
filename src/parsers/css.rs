//! CSS 解析器模块
//!
//! 读取元素 `style` 属性中的声明，供译文元素复制原文的视觉样式。
//! 只做声明级别的切分，属性值原样保留（去掉 `!important`）。

use cssparser::{Parser, ParserInput, Token};

/// 解析内联样式声明列表
///
/// 返回按出现顺序排列的 `(属性名, 值)`，属性名统一为小写；
/// 同名属性以后出现的为准。无法识别的片段被跳过。
///
/// # 示例
///
/// ```rust
/// use inline_translator::parsers::css::parse_inline_style;
///
/// let decls = parse_inline_style("color: red; font-size: 14px");
/// assert_eq!(decls[0], ("color".to_string(), "red".to_string()));
/// ```
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);

    let mut declarations: Vec<(String, String)> = Vec::new();
    let mut pending_name: Option<String> = None;
    let mut current_prop: Option<String> = None;
    let mut value_start = parser.position();

    loop {
        let token_offset = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Ident(ref name) if current_prop.is_none() => {
                pending_name = Some(name.to_ascii_lowercase());
            }
            Token::Colon if current_prop.is_none() => {
                current_prop = pending_name.take();
                value_start = parser.position();
            }
            Token::Semicolon => {
                if let Some(prop) = current_prop.take() {
                    let value = parser.slice(value_start..token_offset);
                    push_declaration(&mut declarations, prop, value);
                }
                pending_name = None;
            }
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            _ => {
                if current_prop.is_none() {
                    pending_name = None;
                }
            }
        }
    }

    // 最后一条声明可以没有分号
    if let Some(prop) = current_prop {
        let value = parser.slice_from(value_start);
        push_declaration(&mut declarations, prop, value);
    }

    declarations
}

fn push_declaration(declarations: &mut Vec<(String, String)>, prop: String, raw_value: &str) {
    let value = raw_value.trim();
    let value = value
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value);

    if value.is_empty() {
        return;
    }

    match declarations.iter_mut().find(|(name, _)| *name == prop) {
        Some(existing) => existing.1 = value.to_string(),
        None => declarations.push((prop, value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_declarations() {
        let decls = parse_inline_style("color: red; font-size: 14px;");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("font-size".to_string(), "14px".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_function_values_and_last_wins() {
        let decls = parse_inline_style("COLOR: rgb(1, 2, 3); margin: 0 auto; color: blue !important");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], ("color".to_string(), "blue".to_string()));
        assert_eq!(decls[1], ("margin".to_string(), "0 auto".to_string()));
    }

    #[test]
    fn test_parse_skips_garbage() {
        let decls = parse_inline_style(";;: nothing; padding 4px; line-height: 1.5");
        assert_eq!(decls, vec![("line-height".to_string(), "1.5".to_string())]);
    }

    #[test]
    fn test_parse_font_family_with_quotes() {
        let decls = parse_inline_style(r#"font-family: "Helvetica Neue", Arial"#);
        assert_eq!(decls[0].1, r#""Helvetica Neue", Arial"#);
    }
}
