//! Tests for router module

use super::*;
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;

fn gateway(mock: &MockProvider) -> LlmGateway {
    LlmGateway::new(Arc::new(mock.clone()), GatewayConfig::default())
}

#[test]
fn test_task_type_recommended_tier() {
    assert_eq!(
        TaskType::Classification.recommended_tier(),
        ModelTier::Lightweight
    );
    assert_eq!(
        TaskType::Translation.recommended_tier(),
        ModelTier::Lightweight
    );
    assert_eq!(
        TaskType::Extraction.recommended_tier(),
        ModelTier::HighPerformance
    );
    assert_eq!(
        TaskType::Generation.recommended_tier(),
        ModelTier::HighPerformance
    );
    assert_eq!(
        TaskType::Conversation.recommended_tier(),
        ModelTier::HighPerformance
    );
}

#[test]
fn test_token_budgets() {
    assert_eq!(TaskType::Classification.default_token_budget().max_tokens, 200);
    assert_eq!(TaskType::Classification.default_token_budget().temperature, 0.0);
    assert!(
        TaskType::Generation.default_token_budget().max_tokens
            > TaskType::Extraction.default_token_budget().max_tokens
    );
    assert_eq!(TokenBudget::default(), TokenBudget::new(2048, 0.7));
}

#[test]
fn test_gateway_config_model_for() {
    let config = GatewayConfig {
        lightweight_model: "small".to_string(),
        high_performance_model: "large".to_string(),
        timeout_secs: 0,
    };
    assert_eq!(config.model_for(ModelTier::Lightweight), "small");
    assert_eq!(config.model_for(ModelTier::HighPerformance), "large");
    assert_eq!(config.timeout(), Duration::from_secs(1));
}

#[tokio::test]
async fn test_generate_uses_tier_model() {
    let mock = MockProvider::new();
    mock.push_response("calendar");
    let gw = gateway(&mock);

    let out = gw
        .generate_for(TaskType::Classification, "classify this")
        .await
        .unwrap();
    assert_eq!(out, "calendar");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(requests[0].max_tokens, Some(200));

    gw.generate(ModelTier::HighPerformance, "write").await.unwrap();
    assert_eq!(mock.requests()[1].model, "gpt-4o");
}

#[tokio::test]
async fn test_generate_with_system_sends_two_messages() {
    let mock = MockProvider::new();
    let gw = gateway(&mock);

    gw.generate_with_system(TaskType::Translation, "You translate.", "안녕")
        .await
        .unwrap();

    let request = &mock.requests()[0];
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].content, "You translate.");
}

#[tokio::test]
async fn test_generate_structured_decodes_noisy_output() {
    let mock = MockProvider::new();
    mock.push_response("Sure:\n```json\n{'action': 'add', 'ok': True}\n```");
    let gw = gateway(&mock);

    let value = gw
        .generate_structured(ModelTier::Lightweight, "extract", "{\"action\": string}")
        .await
        .unwrap();
    assert_eq!(value["action"], "add");
    assert_eq!(value["ok"], true);

    let prompt = &mock.prompts()[0];
    assert!(prompt.contains("Output schema"));
    assert!(prompt.contains("JSON only"));
}

#[tokio::test]
async fn test_generate_structured_parse_error() {
    let mock = MockProvider::new();
    mock.push_response("I cannot help with that.");
    let gw = gateway(&mock);

    let err = gw
        .generate_structured(ModelTier::Lightweight, "extract", "")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let mock = MockProvider::new();
    mock.push_error(Error::RateLimit);
    let gw = gateway(&mock);

    let err = gw.generate(ModelTier::Lightweight, "hi").await.unwrap_err();
    assert!(matches!(err, Error::RateLimit));
    assert!(err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn test_gateway_timeout() {
    let mock = MockProvider::new().with_delay(Duration::from_secs(120));
    let config = GatewayConfig {
        timeout_secs: 2,
        ..GatewayConfig::default()
    };
    let gw = LlmGateway::new(Arc::new(mock), config);

    let err = gw.generate(ModelTier::Lightweight, "hi").await.unwrap_err();
    assert!(matches!(err, Error::Timeout(2000)));
}

#[tokio::test]
async fn test_mock_rules_take_precedence_and_echo_default() {
    let mock = MockProvider::new();
    mock.on_prompt_containing("Classify", "resume");
    mock.push_response("queued");
    let gw = gateway(&mock);

    assert_eq!(
        gw.generate(ModelTier::Lightweight, "Classify: write my CV")
            .await
            .unwrap(),
        "resume"
    );
    assert_eq!(
        gw.generate(ModelTier::Lightweight, "other").await.unwrap(),
        "queued"
    );
    assert_eq!(
        gw.generate(ModelTier::Lightweight, "echo me").await.unwrap(),
        "echo me"
    );
    assert_eq!(mock.call_count(), 3);
}
