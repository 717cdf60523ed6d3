//! Bedrock Anthropic pipeline against a mock runtime endpoint.

use futures_util::StreamExt;
use manifold_pipelines::LlmError;
use manifold_pipelines::pipeline::{InvocationResult, Pipeline};
use manifold_pipelines::providers::bedrock::models::{
    CLAUDE_3_5_SONNET, CLAUDE_3_HAIKU, VIDEO_HOOK_SYSTEM_PROMPT,
};
use manifold_pipelines::providers::bedrock::{BedrockConfig, BedrockPipeline};
use manifold_pipelines::streaming::CompletionState;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[path = "support/fixtures.rs"]
mod support;

const HAIKU_INVOKE: &str = "/model/anthropic.claude-3-haiku-20240307-v1%3A0/invoke";
const HAIKU_STREAM: &str = "/model/anthropic.claude-3-haiku-20240307-v1%3A0/invoke-with-response-stream";
const SONNET_INVOKE: &str = "/model/anthropic.claude-3-5-sonnet-20240620-v1%3A0/invoke";

fn pipeline(server: &MockServer) -> BedrockPipeline {
    BedrockPipeline::anthropic(
        BedrockConfig::new("us-east-1")
            .with_endpoint(server.uri())
            .with_api_key("test-token"),
    )
    .expect("pipeline")
}

fn body_of(req: &Request) -> Value {
    serde_json::from_slice(&req.body).unwrap_or(Value::Null)
}

fn text_reply(text: &str) -> Value {
    json!({
        "id": "msg_bdrk_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 3}
    })
}

fn tiny_png() -> String {
    "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk".to_string()
}

#[tokio::test]
async fn lists_registered_models_in_order() {
    let server = MockServer::start().await;
    let models = pipeline(&server).list_models().await;
    let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        ["claude-3-haiku", "claude-3.5-sonnet", "claude-3.5-sonnet (video_hook)"]
    );
}

#[tokio::test]
async fn plain_call_applies_defaults_and_strips_bookkeeping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .and(header("authorization", "Bearer test-token"))
        .and(|req: &Request| {
            let v = body_of(req);
            v["anthropic_version"] == "bedrock-2023-05-31"
                && v["max_tokens"] == 4096
                && v["temperature"] == 0.8
                && v["top_k"] == 40
                && v["top_p"] == 0.9
                && v["stop_sequences"] == json!([])
                && v["system"] == "You are terse."
                && v["messages"]
                    == json!([{"role": "user", "content": [{"type": "text", "text": "Hi"}]}])
                && support::has_no_bookkeeping(&v)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Hello there")))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([
            {"role": "system", "content": "You are terse."},
            {"role": "user", "content": "Hi"}
        ]),
        json!({}),
    );
    match pipeline(&server).pipe(request).await.unwrap() {
        InvocationResult::Text(text) => assert_eq!(text, "Hello there"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn caller_options_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .and(|req: &Request| {
            let v = body_of(req);
            v["max_tokens"] == 256 && v["temperature"] == 0.2 && v["stop_sequences"] == json!(["\n\nHuman:"])
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([{"role": "user", "content": "Hi"}]),
        json!({"max_tokens": 256, "temperature": 0.2, "stop": "\n\nHuman:"}),
    );
    let result = pipeline(&server).pipe(request).await.unwrap();
    assert_eq!(result.into_text().await.unwrap(), "ok");
}

#[tokio::test]
async fn variant_sends_fixed_prompt_to_base_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SONNET_INVOKE))
        .and(|req: &Request| body_of(req)["system"] == VIDEO_HOOK_SYSTEM_PROMPT)
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Title: ...")))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        &format!("{CLAUDE_3_5_SONNET}__video_hook"),
        json!([
            {"role": "system", "content": "ignored in favour of the fixed prompt"},
            {"role": "user", "content": "sourdough at home"}
        ]),
        json!({}),
    );
    let result = pipeline(&server).pipe(request).await.unwrap();
    assert_eq!(result.into_text().await.unwrap(), "Title: ...");
}

#[tokio::test]
async fn images_are_sent_as_blocks_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .and(|req: &Request| {
            let content = body_of(req)["messages"][0]["content"].clone();
            content[0] == json!({"type": "text", "text": "compare"})
                && content[1]["source"]["type"] == "base64"
                && content[1]["source"]["media_type"] == "image/png"
                && content[2] == json!({"type": "image", "source": {"type": "url", "url": "https://example.com/b.jpg"}})
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("same")))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([{"role": "user", "content": [
            {"type": "text", "text": "compare"},
            {"type": "image_url", "image_url": {"url": tiny_png()}},
            {"type": "image_url", "image_url": {"url": "https://example.com/b.jpg"}}
        ]}]),
        json!({}),
    );
    assert!(!pipeline(&server).pipe(request).await.unwrap().is_error());
}

#[tokio::test]
async fn sixth_image_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("unreachable")))
        .expect(0)
        .mount(&server)
        .await;

    let mut parts = vec![json!({"type": "text", "text": "six images"})];
    for _ in 0..6 {
        parts.push(json!({"type": "image_url", "image_url": {"url": tiny_png()}}));
    }
    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([{"role": "user", "content": parts}]),
        json!({}),
    );
    let err = pipeline(&server).pipe(request).await.unwrap_err();
    assert!(
        matches!(err, LlmError::LimitExceeded(ref m) if m == "Maximum of 5 images per API call exceeded"),
        "{err:?}"
    );
}

#[tokio::test]
async fn images_across_turns_share_the_budget() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("unreachable")))
        .expect(0)
        .mount(&server)
        .await;

    let three = |text: &str| {
        let mut parts = vec![json!({"type": "text", "text": text})];
        for i in 0..3 {
            parts.push(json!({"type": "image_url", "image_url": {"url": format!("https://example.com/{i}.png")}}));
        }
        Value::Array(parts)
    };
    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([
            {"role": "user", "content": three("first")},
            {"role": "assistant", "content": "noted"},
            {"role": "user", "content": three("second")}
        ]),
        json!({}),
    );
    assert!(matches!(
        pipeline(&server).pipe(request).await,
        Err(LlmError::LimitExceeded(_))
    ));
}

#[tokio::test]
async fn empty_messages_fail_validation() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = support::pipe_request(CLAUDE_3_HAIKU, json!([]), json!({}));
    assert!(matches!(
        pipeline(&server).pipe(request).await,
        Err(LlmError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn streaming_yields_text_fragments_and_finishes() {
    let server = MockServer::start().await;
    let events = support::load_jsonl_fixture("tests/fixtures/bedrock/anthropic_hello_world.jsonl");
    Mock::given(method("POST"))
        .and(path(HAIKU_STREAM))
        .and(header("accept", "application/vnd.amazon.eventstream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/vnd.amazon.eventstream")
                .set_body_bytes(support::event_stream_body(&events)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([{"role": "user", "content": "Say hello world"}]),
        json!({"stream": true}),
    );
    let InvocationResult::Stream(stream) = pipeline(&server).pipe(request).await.unwrap() else {
        panic!("expected a stream");
    };
    let completion = stream.completion();
    let fragments: Vec<String> = stream.map(|r| r.expect("fragment")).collect().await;
    assert_eq!(fragments, ["Hel", "lo", " world"]);
    assert_eq!(
        completion.state(),
        CompletionState::Finished {
            stop_reason: Some("end_turn".into())
        }
    );
}

#[tokio::test]
async fn stream_without_terminal_event_is_truncated() {
    let server = MockServer::start().await;
    let events = support::load_jsonl_fixture("tests/fixtures/bedrock/anthropic_hello_world.jsonl");
    Mock::given(method("POST"))
        .and(path(HAIKU_STREAM))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(support::event_stream_body(&events[..4])),
        )
        .mount(&server)
        .await;

    let request = support::pipe_request(
        CLAUDE_3_HAIKU,
        json!([{"role": "user", "content": "Say hello world"}]),
        json!({"stream": true}),
    );
    let InvocationResult::Stream(stream) = pipeline(&server).pipe(request).await.unwrap() else {
        panic!("expected a stream");
    };
    let completion = stream.completion();
    assert_eq!(stream.collect_text().await.unwrap(), "Hello");
    assert_eq!(completion.state(), CompletionState::Truncated);
}

#[tokio::test]
async fn vendor_failures_become_error_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "__type": "ThrottlingException",
            "message": "Too many requests, please wait before trying again."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(CLAUDE_3_HAIKU, json!([{"role": "user", "content": "Hi"}]), json!({}));
    match pipeline(&server).pipe(request).await.unwrap() {
        InvocationResult::Error(message) => {
            assert!(message.starts_with("Error: "), "{message}");
            assert!(message.contains("Too many requests"), "{message}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn malformed_envelope_is_a_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let request = support::pipe_request(CLAUDE_3_HAIKU, json!([{"role": "user", "content": "Hi"}]), json!({}));
    assert!(matches!(
        pipeline(&server).pipe(request).await,
        Err(LlmError::ParseError(_))
    ));
}

#[tokio::test]
async fn reconfigure_swaps_the_runtime() {
    let broken = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&broken)
        .await;
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HAIKU_INVOKE))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("back")))
        .expect(1)
        .mount(&healthy)
        .await;

    let pipeline = pipeline(&broken);
    let hi = || support::pipe_request(CLAUDE_3_HAIKU, json!([{"role": "user", "content": "Hi"}]), json!({}));
    assert!(pipeline.pipe(hi()).await.unwrap().is_error());

    let config = pipeline.config().await.with_endpoint(healthy.uri());
    pipeline.reconfigure(config).await.unwrap();
    pipeline.on_config_changed().await.unwrap();
    assert_eq!(pipeline.config().await.base_url(), healthy.uri());
    assert_eq!(
        pipeline.pipe(hi()).await.unwrap().into_text().await.unwrap(),
        "back"
    );
}

#[tokio::test]
async fn invalid_reconfiguration_keeps_the_previous_runtime() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server);
    let bad = BedrockConfig::default();
    assert!(matches!(
        pipeline.reconfigure(bad).await,
        Err(LlmError::ConfigurationError(_))
    ));
    assert_eq!(pipeline.config().await.base_url(), server.uri());
}
