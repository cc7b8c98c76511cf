//! 主接口失败时切换到备用接口

use async_trait::async_trait;
use tracing::warn;

use crate::translation::error::TranslationResult;
use crate::translation::gateway::TranslationGateway;

pub struct FallbackGateway {
    primary: Box<dyn TranslationGateway>,
    secondary: Option<Box<dyn TranslationGateway>>,
}

impl FallbackGateway {
    pub fn new(
        primary: Box<dyn TranslationGateway>,
        secondary: Option<Box<dyn TranslationGateway>>,
    ) -> Self {
        Self { primary, secondary }
    }
}

/// 截断或补空，使译文数量与原文一致
fn normalize_len(mut translations: Vec<String>, expected: usize, gateway: &str) -> Vec<String> {
    if translations.len() != expected {
        warn!(
            "{} 返回 {} 条译文，期望 {} 条",
            gateway,
            translations.len(),
            expected
        );
        translations.resize(expected, String::new());
    }
    translations
}

#[async_trait(?Send)]
impl TranslationGateway for FallbackGateway {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> TranslationResult<Vec<String>> {
        match self.primary.translate(texts, source, target).await {
            Ok(translations) => Ok(normalize_len(translations, texts.len(), self.primary.name())),
            Err(error) => {
                let Some(secondary) = &self.secondary else {
                    return Err(error);
                };
                warn!(
                    "{} 翻译失败，尝试备用接口 {}: {}",
                    self.primary.name(),
                    secondary.name(),
                    error
                );
                let translations = secondary
                    .translate(texts, source, target)
                    .await
                    .map_err(|e| e.with_context(secondary.name()))?;
                Ok(normalize_len(translations, texts.len(), secondary.name()))
            }
        }
    }

    fn set_model(&self, model: &str) {
        self.primary.set_model(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::TranslationError;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixed {
        reply: Option<Vec<String>>,
        calls: Rc<Cell<usize>>,
    }

    #[async_trait(?Send)]
    impl TranslationGateway for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn translate(
            &self,
            _texts: &[String],
            _source: &str,
            _target: &str,
        ) -> TranslationResult<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            self.reply
                .clone()
                .ok_or_else(|| TranslationError::NetworkError("down".to_string()))
        }
    }

    fn fixed(reply: Option<&[&str]>) -> (Box<dyn TranslationGateway>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let gateway = Fixed {
            reply: reply.map(|r| r.iter().map(|s| s.to_string()).collect()),
            calls: calls.clone(),
        };
        (Box::new(gateway), calls)
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let (primary, _) = fixed(Some(&["甲", "乙"]));
        let (secondary, secondary_calls) = fixed(Some(&["x", "y"]));
        let chain = FallbackGateway::new(primary, Some(secondary));

        let out = chain.translate(&texts(2), "en", "zh-CN").await.unwrap();
        assert_eq!(out, vec!["甲", "乙"]);
        assert_eq!(secondary_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_secondary() {
        let (primary, _) = fixed(None);
        let (secondary, secondary_calls) = fixed(Some(&["备用"]));
        let chain = FallbackGateway::new(primary, Some(secondary));

        let out = chain.translate(&texts(1), "en", "zh-CN").await.unwrap();
        assert_eq!(out, vec!["备用"]);
        assert_eq!(secondary_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_both_failing_surfaces_error() {
        let (primary, _) = fixed(None);
        let (secondary, _) = fixed(None);
        let chain = FallbackGateway::new(primary, Some(secondary));
        assert!(chain.translate(&texts(1), "en", "zh-CN").await.is_err());

        let (primary, _) = fixed(None);
        let chain = FallbackGateway::new(primary, None);
        assert!(chain.translate(&texts(1), "en", "zh-CN").await.is_err());
    }

    #[tokio::test]
    async fn test_output_length_matches_input() {
        let (primary, _) = fixed(Some(&["only one"]));
        let chain = FallbackGateway::new(primary, None);
        let out = chain.translate(&texts(3), "en", "zh-CN").await.unwrap();
        assert_eq!(out, vec!["only one", "", ""]);
    }
}
