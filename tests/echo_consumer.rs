//! End-to-end tests: HTTP request → consumer → mesh connection → echo provider.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use circuitbreak_consumer::consumer::{classify, Classifier};
use circuitbreak_consumer::mesh::{DoneInfo, RetStatus};
use circuitbreak_consumer::provider::EchoProvider;
use tonic::Code;

mod common;

fn lines(body: &str) -> Vec<&str> {
    assert!(body.is_empty() || body.ends_with('\n'), "every line is newline-terminated");
    body.split_terminator('\n').collect()
}

#[tokio::test]
async fn test_echo_hello_three_times() {
    let provider_addr: SocketAddr = "127.0.0.1:28501".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;

    // Keep the trailing delay at its default.
    let mut config = common::consumer_config("EchoHello", &[provider_addr]);
    config.echo.response_delay_ms = 100;
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let started = Instant::now();
    let res = common::http_client()
        .get(format!("{}/?value=hello&count=3", url))
        .send()
        .await
        .expect("consumer unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "hello\nhello\nhello\n");
    assert!(started.elapsed() >= Duration::from_millis(100));

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_count_defaults_to_twenty() {
    let provider_addr: SocketAddr = "127.0.0.1:28502".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;
    let config = common::consumer_config("EchoDefaults", &[provider_addr]);
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;
    let client = common::http_client();

    for query in ["value=x", "value=x&count=0", "count=-3&value=x", "value=x&count=abc"] {
        let res = client.get(format!("{}/?{}", url, query)).send().await.unwrap();
        assert_eq!(res.status(), 200, "query {}", query);
        let body = res.text().await.unwrap();
        let lines = lines(&body);
        assert_eq!(lines.len(), 20, "query {}", query);
        assert!(lines.iter().all(|l| *l == "x"));
    }

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_missing_value_echoes_empty_payload() {
    let provider_addr: SocketAddr = "127.0.0.1:28503".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;
    let config = common::consumer_config("EchoEmpty", &[provider_addr]);
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = common::http_client()
        .get(format!("{}/any/path?count=2", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "\n\n");

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_form_body_is_parsed() {
    let provider_addr: SocketAddr = "127.0.0.1:28504".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;
    let config = common::consumer_config("EchoPost", &[provider_addr]);
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = common::http_client()
        .post(format!("{}/?value=ignored", url))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("value=posted+body&count=2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "posted body\nposted body\n");

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_malformed_form_is_500() {
    let provider_addr: SocketAddr = "127.0.0.1:28505".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;
    let config = common::consumer_config("EchoMalformed", &[provider_addr]);
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;
    let client = common::http_client();

    let res = client.get(format!("{}/?value=%zz&count=2", url)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), r#"invalid URL escape "%zz""#);

    let res = client.get(format!("{}/?value=a;count=2", url)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "invalid semicolon separator in query");

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_failing_backend_produces_error_lines() {
    let provider_addr: SocketAddr = "127.0.0.1:28506".parse().unwrap();
    let echo = EchoProvider::failing(Code::Unavailable);
    let provider = common::start_provider(provider_addr, echo.clone()).await;

    let mut config = common::consumer_config("EchoFailing", &[provider_addr]);
    config.circuit_breaker.enabled = false;
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = common::http_client()
        .get(format!("{}/?value=hello&count=3", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    let lines = lines(&body);
    assert_eq!(lines.len(), 3);
    for line in lines {
        assert_eq!(
            line,
            "rpc error: code = Unavailable desc = echo provider configured to fail"
        );
    }
    assert_eq!(echo.served(), 3);

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_circuit_breaker_isolates_failing_instance() {
    let bad_addr: SocketAddr = "127.0.0.1:28507".parse().unwrap();
    let good_addr: SocketAddr = "127.0.0.1:28508".parse().unwrap();
    let bad = EchoProvider::failing(Code::Internal);
    let good = EchoProvider::new();
    let bad_provider = common::start_provider(bad_addr, bad.clone()).await;
    let good_provider = common::start_provider(good_addr, good.clone()).await;

    let mut config = common::consumer_config("CircuitBreakerEchoServerGRPC", &[bad_addr, good_addr]);
    config.circuit_breaker.enabled = true;
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.sleep_window_ms = 60_000;
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = common::http_client()
        .get(format!("{}/?value=hello&count=10", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    let lines = lines(&body);
    assert_eq!(lines.len(), 10);

    let errors = lines.iter().filter(|l| l.starts_with("rpc error: code = Internal")).count();
    let echoed = lines.iter().filter(|l| **l == "hello").count();
    assert_eq!(errors, 2, "breaker opens after the threshold");
    assert_eq!(echoed, 8);
    assert_eq!(bad.served(), 2);
    assert_eq!(good.served(), 8);

    consumer.trigger();
    bad_provider.trigger();
    good_provider.trigger();
}

#[tokio::test]
async fn test_analyzer_classifies_every_call() {
    let provider_addr: SocketAddr = "127.0.0.1:28509".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;

    let seen: Arc<Mutex<Vec<(RetStatus, u32)>>> = Arc::default();
    let record = seen.clone();
    let analyzer = move |info: &DoneInfo<'_>| {
        let outcome = classify(info);
        record.lock().unwrap().push(outcome);
        outcome
    };

    let config = common::consumer_config("EchoRecorded", &[provider_addr]);
    let (url, consumer) = common::start_consumer(config, Arc::new(analyzer)).await;

    let res = common::http_client()
        .get(format!("{}/?value=ping&count=5", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "ping\n".repeat(5));
    assert_eq!(*seen.lock().unwrap(), vec![(RetStatus::Success, 0); 5]);

    consumer.trigger();
    provider.trigger();
}

#[tokio::test]
async fn test_unreachable_instance_trips_breaker() {
    // Nothing listens here.
    let dead_addr: SocketAddr = "127.0.0.1:28510".parse().unwrap();

    let seen: Arc<Mutex<Vec<(RetStatus, u32)>>> = Arc::default();
    let record = seen.clone();
    let analyzer = move |info: &DoneInfo<'_>| {
        let outcome = classify(info);
        record.lock().unwrap().push(outcome);
        outcome
    };

    let mut config = common::consumer_config("EchoDead", &[dead_addr]);
    config.circuit_breaker.failure_threshold = 1;
    let (url, consumer) = common::start_consumer(config, Arc::new(analyzer)).await;

    let res = common::http_client()
        .get(format!("{}/?value=ping&count=4", url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    let lines = lines(&body);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("rpc error: code = "));
    for line in &lines[1..] {
        assert!(line.starts_with(
            "rpc error: code = Unavailable desc = no available instance for service EchoDead"
        ));
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|(status, _)| *status == RetStatus::Fail));
    assert!(seen[1..].iter().all(|(_, code)| *code == 14));

    consumer.trigger();
}

#[tokio::test]
async fn test_slow_response_keeps_every_line() {
    let provider_addr: SocketAddr = "127.0.0.1:28511".parse().unwrap();
    let provider = common::start_provider(provider_addr, EchoProvider::new()).await;
    let client = common::http_client();

    // No request timeout by default: the loop always runs to completion.
    let mut config = common::consumer_config("EchoSlow", &[provider_addr]);
    config.echo.response_delay_ms = 1_500;
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = client.get(format!("{}/?value=hi&count=2", url)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "hi\nhi\n");
    consumer.trigger();

    // An explicitly configured timeout still applies.
    let mut config = common::consumer_config("EchoSlow", &[provider_addr]);
    config.echo.response_delay_ms = 1_500;
    config.timeouts.request_secs = Some(1);
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;

    let res = client.get(format!("{}/?value=hi&count=2", url)).send().await.unwrap();
    assert_eq!(res.status(), 408);
    consumer.trigger();

    provider.trigger();
}

#[tokio::test]
async fn test_concurrent_requests_share_breaker() {
    let provider_addr: SocketAddr = "127.0.0.1:28512".parse().unwrap();
    let echo = EchoProvider::failing_first(Code::Internal, 2);
    let provider = common::start_provider(provider_addr, echo.clone()).await;

    let mut config = common::consumer_config("EchoRecovering", &[provider_addr]);
    config.circuit_breaker.enabled = true;
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.sleep_window_ms = 500;
    config.circuit_breaker.half_open_successes = 1;
    let (url, consumer) = common::start_consumer(config, Arc::new(Classifier)).await;
    let client = common::http_client();

    let request = |count: u32| {
        let client = client.clone();
        let url = format!("{}/?value=hi&count={}", url, count);
        async move {
            let res = client.get(url).send().await.unwrap();
            assert_eq!(res.status(), 200);
            res.text().await.unwrap()
        }
    };

    let (first, second) = tokio::join!(request(10), request(10));
    let mut failed = 0;
    let mut refused = 0;
    for body in [&first, &second] {
        let lines = lines(body);
        assert_eq!(lines.len(), 10);
        for line in lines {
            if line.starts_with("rpc error: code = Internal") {
                failed += 1;
            } else if line.starts_with("rpc error: code = Unavailable desc = no available instance") {
                refused += 1;
            } else {
                assert_eq!(line, "hi");
            }
        }
    }
    assert_eq!(failed, 2, "only the provider's failing calls surface as Internal");
    assert!(refused > 0, "the open circuit refuses calls for both requests");

    // After the sleep window one probe succeeds and closes the circuit.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(request(5).await, "hi\n".repeat(5));

    consumer.trigger();
    provider.trigger();
}
