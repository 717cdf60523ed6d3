//! Bedrock Meta Llama pipeline against a mock runtime endpoint.

use futures_util::StreamExt;
use manifold_pipelines::pipeline::{InvocationResult, Pipeline};
use manifold_pipelines::providers::bedrock::llama::render_prompt;
use manifold_pipelines::providers::bedrock::models::{LLAMA3_1_8B, LLAMA3_1_70B};
use manifold_pipelines::providers::bedrock::{BedrockConfig, BedrockPipeline};
use manifold_pipelines::streaming::CompletionState;
use manifold_pipelines::types::ChatMessage;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[path = "support/fixtures.rs"]
mod support;

const LLAMA_8B_INVOKE: &str = "/model/meta.llama3-1-8b-instruct-v1%3A0/invoke";
const LLAMA_70B_STREAM: &str = "/model/meta.llama3-1-70b-instruct-v1%3A0/invoke-with-response-stream";

fn pipeline(server: &MockServer) -> BedrockPipeline {
    BedrockPipeline::llama(
        BedrockConfig::new("us-west-2")
            .with_endpoint(server.uri())
            .with_api_key("test-token"),
    )
    .expect("pipeline")
}

fn body_of(req: &Request) -> Value {
    serde_json::from_slice(&req.body).unwrap_or(Value::Null)
}

#[tokio::test]
async fn identity_and_models() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server);
    assert_eq!(pipeline.id(), "aws_meta");
    assert_eq!(pipeline.name(), "AWS Meta: ");
    let ids: Vec<_> = pipeline
        .list_models()
        .await
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(
        ids,
        [
            "meta.llama3-1-8b-instruct-v1:0",
            "meta.llama3-1-70b-instruct-v1:0",
            "meta.llama3-1-405b-instruct-v1:0"
        ]
    );
}

#[tokio::test]
async fn conversation_is_templated_into_one_prompt() {
    let server = MockServer::start().await;
    let conversation = json!([
        {"role": "system", "content": "Answer in French."},
        {"role": "user", "content": "What colour is the sky?"}
    ]);
    let expected_prompt = render_prompt(&[
        ChatMessage::system("Answer in French."),
        ChatMessage::user("What colour is the sky?"),
    ]);
    assert!(expected_prompt.contains("<|system_id|>\n\nAnswer in French.\n<|eot_id|>\n"));

    Mock::given(method("POST"))
        .and(path(LLAMA_8B_INVOKE))
        .and(move |req: &Request| {
            let v = body_of(req);
            v == json!({
                "max_gen_len": 2048,
                "temperature": 0.8,
                "top_p": 0.9,
                "prompt": expected_prompt,
            })
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generation": "Le ciel est bleu.",
            "prompt_token_count": 120,
            "generation_token_count": 6,
            "stop_reason": "stop"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(LLAMA3_1_8B, conversation, json!({}));
    let result = pipeline(&server).pipe(request).await.unwrap();
    assert_eq!(result.into_text().await.unwrap(), "Le ciel est bleu.");
}

#[tokio::test]
async fn max_tokens_maps_to_max_gen_len() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LLAMA_8B_INVOKE))
        .and(|req: &Request| {
            let v = body_of(req);
            v["max_gen_len"] == 64 && v["top_p"] == 0.5 && support::has_no_bookkeeping(&v)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generation": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        LLAMA3_1_8B,
        json!([{"role": "user", "content": "hi"}]),
        json!({"max_tokens": 64, "top_p": 0.5}),
    );
    let result = pipeline(&server).pipe(request).await.unwrap();
    assert_eq!(result.into_text().await.unwrap(), "ok");
}

#[tokio::test]
async fn streaming_yields_generations_until_stop_reason() {
    let server = MockServer::start().await;
    let events = support::load_jsonl_fixture("tests/fixtures/bedrock/llama_stream.jsonl");
    Mock::given(method("POST"))
        .and(path(LLAMA_70B_STREAM))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/vnd.amazon.eventstream")
                .set_body_bytes(support::event_stream_body(&events)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = support::pipe_request(
        LLAMA3_1_70B,
        json!([{"role": "user", "content": "What colour is the sky?"}]),
        json!({"stream": true}),
    );
    let InvocationResult::Stream(stream) = pipeline(&server).pipe(request).await.unwrap() else {
        panic!("expected a stream");
    };
    let completion = stream.completion();
    let fragments: Vec<String> = stream.map(|r| r.expect("fragment")).collect().await;
    assert_eq!(fragments, ["The", " sky", " is blue."]);
    assert_eq!(
        completion.state(),
        CompletionState::Finished {
            stop_reason: Some("stop".into())
        }
    );
}

#[tokio::test]
async fn stream_exception_frame_fails_the_stream() {
    let server = MockServer::start().await;
    let mut body = support::event_stream_body(&[json!({"generation": "The", "stop_reason": null})]);
    body.extend_from_slice(&manifold_pipelines::streaming::aws_event_stream::encode_message(
        &[
            (":message-type", "exception"),
            (":exception-type", "modelStreamErrorException"),
            (":content-type", "application/json"),
        ],
        br#"{"message":"model crashed"}"#,
    ));
    Mock::given(method("POST"))
        .and(path(LLAMA_70B_STREAM))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let request = support::pipe_request(
        LLAMA3_1_70B,
        json!([{"role": "user", "content": "hi"}]),
        json!({"stream": true}),
    );
    let InvocationResult::Stream(stream) = pipeline(&server).pipe(request).await.unwrap() else {
        panic!("expected a stream");
    };
    let completion = stream.completion();
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().ok(), Some("The"));
    assert!(items[1].is_err());
    assert!(matches!(completion.state(), CompletionState::Failed(ref m) if m.contains("model crashed")));
}

#[tokio::test]
async fn not_found_model_is_reported_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "The provided model identifier is invalid."
        })))
        .mount(&server)
        .await;

    let request = support::pipe_request(
        "meta.llama2-13b-chat-v1",
        json!([{"role": "user", "content": "hi"}]),
        json!({}),
    );
    match pipeline(&server).pipe(request).await.unwrap() {
        InvocationResult::Error(message) => {
            assert!(message.starts_with("Error: Not found"), "{message}")
        }
        other => panic!("unexpected {other:?}"),
    }
}
