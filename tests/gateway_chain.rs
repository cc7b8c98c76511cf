//! 翻译接口链集成测试

use inline_translator::translation::gateway::{FallbackGateway, TranslationGateway};
use inline_translator::translation::ErrorCategory;

mod common;

use common::MockGateway;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_separated_reply_maps_one_to_one() {
    let (primary, _log) = MockGateway::new();
    let chain = FallbackGateway::new(Box::new(primary.with_reply("A\n---\nB\n---\nC")), None);

    let result = chain
        .translate(&texts(&["one", "two", "three"]), "en", "zh-CN")
        .await
        .unwrap();
    assert_eq!(result, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_short_reply_is_padded() {
    let (primary, _log) = MockGateway::new();
    let chain = FallbackGateway::new(Box::new(primary.with_reply("甲\n---\n乙")), None);

    let result = chain
        .translate(&texts(&["one", "two", "three"]), "en", "zh-CN")
        .await
        .unwrap();
    assert_eq!(result, vec!["甲", "乙", ""]);
}

#[tokio::test]
async fn test_secondary_receives_same_inputs() {
    let (primary, primary_log) = MockGateway::new();
    let (secondary, secondary_log) = MockGateway::new();
    let chain = FallbackGateway::new(
        Box::new(primary.named("primary").failing(1)),
        Some(Box::new(secondary.named("secondary").with_prefix("备用:"))),
    );

    let input = texts(&["Hello", "World"]);
    let result = chain.translate(&input, "en", "zh-CN").await.unwrap();

    assert_eq!(result, vec!["备用:Hello", "备用:World"]);
    assert_eq!(primary_log.calls(), vec![input.clone()]);
    assert_eq!(secondary_log.calls(), vec![input]);
}

#[tokio::test]
async fn test_both_failing_reports_error() {
    let (primary, _p) = MockGateway::new();
    let (secondary, _s) = MockGateway::new();
    let chain = FallbackGateway::new(
        Box::new(primary.named("primary").failing(1)),
        Some(Box::new(secondary.named("backup").failing(1))),
    );

    let error = chain
        .translate(&texts(&["Hello"]), "en", "zh-CN")
        .await
        .unwrap_err();
    assert_eq!(error.category(), ErrorCategory::Network);
    assert!(error.is_retryable());
    assert!(error.to_string().ends_with("(上下文: backup)"));
}
