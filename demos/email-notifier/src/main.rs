//! Email Notifier Demo
//!
//! A small consumer application showing the registration surface:
//!
//! - a typed-payload handler (`Json<Notification>`)
//! - a raw-message handler
//! - a zero-parameter handler
//! - an async handler that takes its time
//! - the built-in error-containment middleware plus a timing middleware
//! - a startup hook bracketing a (pretend) database connection
//!
//! The broker is the in-process [`MemoryBroker`], so the demo runs
//! standalone; swap in a real `BrokerConsumer` implementation to talk
//! to an actual broker.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package email-notifier
//! ```

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use rill::core::memory_broker;
use rill::prelude::*;

#[derive(Debug, Deserialize)]
struct Notification {
    email: String,
    subject: String,
    content: String,
}

/// Typed-payload handler: the framework decodes the record value into
/// a `Notification` before this runs.
async fn send_email_notification(Json(notification): Json<Notification>) -> Result<()> {
    info!(
        email = %notification.email,
        subject = %notification.subject,
        "sending email: {}",
        notification.content
    );
    Ok(())
}

/// Raw-message handler: receives the record unchanged.
async fn advanced_body(message: Message) {
    info!(
        topic = %message.topic(),
        key_len = message.key().len(),
        value_len = message.value().len(),
        "raw message received"
    );
}

/// Zero-parameter handler.
async fn empty_params() {
    info!("empty-params topic ticked");
}

/// Async handler that suspends; the loop waits for it before the next
/// record.
async fn slow_consume() {
    tokio::time::sleep(Duration::from_millis(100)).await;
    info!("slow handler finished");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;

    let (producer, broker) = memory_broker();
    let mut app = ConsumerApp::from_config(&config, broker);

    // Pretend database connection bracketing the whole run.
    app.on_startup(
        hook_fn(
            || async {
                info!("connecting database");
                Ok(())
            },
            || async {
                info!("disconnecting database");
                Ok(())
            },
        )
        .named("db"),
    );

    // First registered middleware is outermost: contain failures so one
    // bad record never stops the loop.
    app.middleware(CatchErrors::new());
    app.middleware(from_fn(|message: Message, next: Next| async move {
        let start = std::time::Instant::now();
        let result = next.run(message).await;
        info!(elapsed = ?start.elapsed(), "dispatch finished");
        result
    }));

    app.subscribe("send-email-notification", send_email_notification)?;
    app.subscribe("advanced-message", advanced_body)?;
    app.subscribe("empty-params", empty_params)?;
    app.subscribe("slow-topic", slow_consume)?;

    // Feed the in-process broker: a valid notification, a malformed one
    // (contained by CatchErrors), a broker-level record error, and one
    // record for each remaining topic.
    producer.send_batch(vec![
        RawRecord::record(
            "send-email-notification",
            b"user-1".to_vec(),
            serde_json::to_vec(&serde_json::json!({
                "email": "user@example.com",
                "subject": "hello",
                "content": "welcome to rill",
            }))?,
        ),
        RawRecord::record("send-email-notification", Vec::new(), b"not json".to_vec()),
        RawRecord::error(Some("send-email-notification".to_string()), "simulated delivery failure"),
        RawRecord::record("advanced-message", b"k".to_vec(), b"opaque bytes".to_vec()),
        RawRecord::record("empty-params", Vec::new(), Vec::new()),
        RawRecord::record("slow-topic", Vec::new(), Vec::new()),
    ]);

    // Let the loop drain the batch, then stop.
    let outcome = app
        .run_until(tokio::time::sleep(Duration::from_secs(1)))
        .await;
    if let Err(e) = &outcome {
        warn!(error = %e, "consumer exited with error");
    }
    outcome.map_err(Into::into)
}
