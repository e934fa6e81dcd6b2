//! The consumer application: registration API, lifecycle bracket, and
//! the consumption loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rill_runtime::ConsumerApp;
//! use rill_framework::{CatchErrors, Json};
//!
//! let mut app = ConsumerApp::new(my_broker_client);
//! app.middleware(CatchErrors::new());
//! app.subscribe("send-email-notification", send_email)?;
//! app.run().await?;
//! ```
//!
//! Registration (`on_startup`, `middleware`, `subscribe`) happens
//! strictly before `run()`; the registry and the middleware chain are
//! immutable afterwards, so the run phase shares them without locking.

use std::collections::HashMap;

use tokio::signal;
use tracing::{debug, info, warn};

use crate::config::RillConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::lifecycle::{LifecycleManager, LifecycleState, StartupHook};
use crate::logging;
use rill_core::{BoxedConsumer, BrokerConsumer, RawRecord};
use rill_framework::{
    DispatchFn, Handler, Middleware, MiddlewareStack, RegistryError, TopicRegistry,
};

/// A topic-consuming application.
///
/// Owns the broker consumer exclusively, maps topics to handlers,
/// wraps every dispatch in the registered middleware chain, and
/// brackets the consumption loop with startup/shutdown hooks.
pub struct ConsumerApp {
    consumer: BoxedConsumer,
    registry: TopicRegistry,
    middleware: MiddlewareStack,
    lifecycle: LifecycleManager,
}

impl ConsumerApp {
    /// Creates an application over the given broker consumer.
    pub fn new(consumer: impl BrokerConsumer) -> Self {
        Self::from_shared(std::sync::Arc::new(consumer))
    }

    /// Creates an application over an already-shared broker consumer.
    pub fn from_shared(consumer: BoxedConsumer) -> Self {
        Self {
            consumer,
            registry: TopicRegistry::new(),
            middleware: MiddlewareStack::new(),
            lifecycle: LifecycleManager::new(),
        }
    }

    /// Creates an application from configuration, initializing logging.
    ///
    /// Broker settings in the config belong to the concrete client the
    /// host process built; they are logged here for visibility.
    pub fn from_config(config: &RillConfig, consumer: impl BrokerConsumer) -> Self {
        logging::init_from_config(&config.logging);
        info!(
            bootstrap_servers = %config.broker.bootstrap_servers,
            group_id = %config.broker.group_id,
            auto_offset_reset = %config.broker.auto_offset_reset,
            "consumer application configured"
        );
        Self::new(consumer)
    }

    /// Registers a startup hook. Hooks acquire in registration order
    /// before consumption begins and release in reverse order on
    /// teardown.
    pub fn on_startup(&mut self, hook: impl StartupHook) -> &mut Self {
        self.lifecycle.register(hook);
        self
    }

    /// Appends a middleware to the dispatch chain. The first registered
    /// middleware becomes the outermost wrapper.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Registers a handler for a topic.
    ///
    /// Fails with [`RegistryError::DuplicateTopic`] if the topic is
    /// already taken; the prior registration stays intact.
    pub fn subscribe<H, T>(&mut self, topic: impl Into<String>, handler: H) -> Result<&mut Self, RegistryError>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.registry.register(topic, handler)?;
        Ok(self)
    }

    /// The registered topic names, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.registry.topics()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Runs the application until Ctrl+C or SIGTERM.
    ///
    /// Never returns under normal operation; exits on an uncontained
    /// error or a shutdown signal, after releasing every lifecycle
    /// resource and closing the broker connection.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs the application until the given future resolves.
    ///
    /// The broker connection is the outermost bracket: hooks release in
    /// reverse order first, then the consumer is closed, on every exit
    /// path.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        // Compose the middleware chain around each handler exactly once.
        let routes: HashMap<String, DispatchFn> = self
            .registry
            .iter()
            .map(|(topic, handler)| (topic.to_string(), self.middleware.wrap(handler.clone())))
            .collect();

        let result = match self.lifecycle.start().await {
            Ok(()) => {
                tokio::pin!(shutdown);
                let loop_result = tokio::select! {
                    res = self.consume_loop(&routes) => res,
                    () = &mut shutdown => {
                        info!("shutdown requested, stopping consumption");
                        Ok(())
                    }
                };
                self.lifecycle.shutdown().await;
                loop_result
            }
            Err(e) => Err(RuntimeError::Lifecycle(e)),
        };

        self.consumer.close().await;
        debug!("broker consumer closed");
        result
    }

    /// The consumption loop: subscribe to all registered topics, then
    /// pull batches and route each record through the composed dispatch
    /// chain, strictly in delivery order.
    async fn consume_loop(&self, routes: &HashMap<String, DispatchFn>) -> RuntimeResult<()> {
        let topics = self.registry.topics();
        if topics.is_empty() {
            return Err(RuntimeError::NoTopics);
        }

        self.consumer.subscribe(&topics).await?;
        info!(?topics, "subscribed, consuming");

        loop {
            let batch = self.consumer.consume().await?;
            for record in batch {
                match record {
                    RawRecord::Error(e) => {
                        warn!(topic = ?e.topic, reason = %e.reason, "broker record error, skipping");
                    }
                    RawRecord::Record(record) => {
                        let message = record.into_message();
                        let dispatch = routes
                            .get(message.topic())
                            .ok_or_else(|| RuntimeError::MissingHandler(message.topic().to_string()))?;
                        // Awaited to completion: no fan-out, no reordering.
                        dispatch(message).await?;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ConsumerApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerApp")
            .field("topics", &self.registry.topics())
            .field("middleware", &self.middleware.len())
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler");

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::hook_fn;
    use parking_lot::Mutex;
    use rill_core::{Message, memory_broker};
    use rill_framework::{CatchErrors, Json, Next, from_fn};
    use serde::Deserialize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Deserialize)]
    struct Ping {
        seq: usize,
    }

    #[tokio::test]
    async fn dispatches_valid_records_and_skips_broker_errors() {
        let (producer, broker) = memory_broker();
        let broker = Arc::new(broker);
        let mut app = ConsumerApp::from_shared(broker.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let token = CancellationToken::new();

        let seen_clone = Arc::clone(&seen);
        let handler_token = token.clone();
        app.subscribe("pings", move |Json(ping): Json<Ping>| {
            let seen = Arc::clone(&seen_clone);
            let token = handler_token.clone();
            async move {
                seen.lock().push(ping.seq);
                if ping.seq == 2 {
                    token.cancel();
                }
            }
        })
        .unwrap();

        producer.send_batch(vec![
            RawRecord::error(Some("pings".to_string()), "delivery failed"),
            RawRecord::record("pings", Vec::new(), br#"{"seq":1}"#.to_vec()),
            RawRecord::record("pings", Vec::new(), br#"{"seq":2}"#.to_vec()),
        ]);

        app.run_until(token.cancelled()).await.unwrap();

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert!(broker.is_closed());
        assert_eq!(broker.subscriptions(), vec!["pings"]);
        assert_eq!(app.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn empty_registry_is_fatal_but_still_unwinds() {
        let (_producer, broker) = memory_broker();
        let broker = Arc::new(broker);
        let mut app = ConsumerApp::from_shared(broker.clone());

        let released = Arc::new(AtomicUsize::new(0));
        let released_clone = Arc::clone(&released);
        app.on_startup(hook_fn(
            || async { Ok(()) },
            move || {
                let released = Arc::clone(&released_clone);
                async move {
                    released.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        ));

        let err = app
            .run_until(futures::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NoTopics));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(broker.is_closed());
    }

    #[tokio::test]
    async fn uncontained_handler_error_is_fatal() {
        let (producer, broker) = memory_broker();
        let broker = Arc::new(broker);
        let mut app = ConsumerApp::from_shared(broker.clone());

        app.subscribe("jobs", |_message: Message| async move {
            Err::<(), _>("boom")
        })
        .unwrap();

        producer.send_record("jobs", Vec::new(), Vec::new());

        let err = app
            .run_until(futures::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Dispatch(_)));
        assert!(broker.is_closed());
        assert_eq!(app.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn catch_errors_keeps_the_loop_alive() {
        let (producer, broker) = memory_broker();
        let mut app = ConsumerApp::new(broker);

        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let calls_clone = Arc::clone(&calls);
        let handler_token = token.clone();
        app.middleware(CatchErrors::new());
        app.subscribe("jobs", move |message: Message| {
            let calls = Arc::clone(&calls_clone);
            let token = handler_token.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if message.value() == b"last" {
                    token.cancel();
                    return Ok(());
                }
                Err("transient failure")
            }
        })
        .unwrap();

        producer.send_batch(vec![
            RawRecord::record("jobs", Vec::new(), b"fails".to_vec()),
            RawRecord::record("jobs", Vec::new(), b"fails".to_vec()),
            RawRecord::record("jobs", Vec::new(), b"last".to_vec()),
        ]);

        app.run_until(token.cancelled()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_releases_hooks_in_reverse_and_closes_the_broker() {
        let (producer, broker) = memory_broker();
        let broker = Arc::new(broker);
        let mut app = ConsumerApp::from_shared(broker.clone());

        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["db", "cache"] {
            let log = Arc::clone(&order);
            app.on_startup(
                hook_fn(
                    || async { Ok(()) },
                    move || {
                        let log = Arc::clone(&log);
                        async move {
                            log.lock().push(name);
                            Ok(())
                        }
                    },
                )
                .named(name),
            );
        }

        let token = CancellationToken::new();
        let handler_token = token.clone();
        app.subscribe("t", move |_message: Message| {
            let token = handler_token.clone();
            async move {
                token.cancel();
            }
        })
        .unwrap();

        producer.send_record("t", Vec::new(), Vec::new());
        app.run_until(token.cancelled()).await.unwrap();

        // Hooks acquired db-then-cache, so they release cache-then-db.
        assert_eq!(*order.lock(), vec!["cache", "db"]);
        assert!(broker.is_closed());
        assert_eq!(app.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn lifecycle_failure_aborts_before_consumption() {
        let (_producer, broker) = memory_broker();
        let broker = Arc::new(broker);
        let mut app = ConsumerApp::from_shared(broker.clone());

        app.subscribe("jobs", |_message: Message| async {}).unwrap();
        app.on_startup(hook_fn(
            || async { Err(crate::lifecycle::LifecycleError::acquire("db", "refused")) },
            || async { Ok(()) },
        ));

        let err = app
            .run_until(futures::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Lifecycle(_)));
        // Consumption never started, but the broker bracket still closes.
        assert!(broker.subscriptions().is_empty());
        assert!(broker.is_closed());
    }

    #[tokio::test]
    async fn middleware_observes_every_dispatched_record() {
        let (producer, broker) = memory_broker();
        let mut app = ConsumerApp::new(broker);

        let order = Arc::new(Mutex::new(Vec::new()));
        let token = CancellationToken::new();

        let mw_order = Arc::clone(&order);
        app.middleware(from_fn(move |message: Message, next: Next| {
            let order = Arc::clone(&mw_order);
            async move {
                order.lock().push("mw-enter");
                let result = next.run(message).await;
                order.lock().push("mw-exit");
                result
            }
        }));

        let handler_order = Arc::clone(&order);
        let handler_token = token.clone();
        app.subscribe("t", move |_message: Message| {
            let order = Arc::clone(&handler_order);
            let token = handler_token.clone();
            async move {
                order.lock().push("handler");
                token.cancel();
            }
        })
        .unwrap();

        producer.send_record("t", Vec::new(), Vec::new());
        app.run_until(token.cancelled()).await.unwrap();

        assert_eq!(*order.lock(), vec!["mw-enter", "handler", "mw-exit"]);
    }
}
