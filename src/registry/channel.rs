use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use nshub_error::{LogLevel, StackError};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use super::{
    list::{deliver, ListenerList},
    Args, Listener,
};

type ChannelKey = Arc<str>;

/// Hook notified with `(channel, listener)` when a listener is added or removed.
pub type SubscriptionHook = Arc<dyn Fn(&str, &Listener) + Send + Sync>;

/// Hook notified when a listener returns an error.
pub type ErrorHook = Arc<dyn Fn(&ListenerFailure) + Send + Sync>;

/// A listener error caught during delivery.
#[derive(Debug, Clone)]
pub struct ListenerFailure {
    /// Label of the registry that was firing (`"action"`, `"event"`, ...).
    pub registry: Arc<str>,
    /// Canonical channel name of the fire.
    pub channel: String,
    /// Set when the failing listener was a generic listener of this namespace.
    pub namespace: Option<String>,
    pub error: StackError,
}

/// Named-channel broadcast registry.
///
/// Supports:
/// - Many listeners per channel, invoked in registration order
/// - One-shot listeners
/// - Removal of one listener or of a whole channel
/// - Added/removed/error hooks
///
/// Delivery is synchronous. Each fire works on a snapshot of the channel
/// taken when it starts and holds no lock while listeners run, so listeners
/// may subscribe, unsubscribe and fire re-entrantly.
#[derive(Clone)]
pub struct ChannelRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    label: Arc<str>,
    /// Exact channel → listeners. Empty channels are dropped.
    channels: DashMap<ChannelKey, ListenerList<Args>>,
    added_hooks: RwLock<Vec<SubscriptionHook>>,
    removed_hooks: RwLock<Vec<SubscriptionHook>>,
    error_hooks: RwLock<Vec<ErrorHook>>,
    /// Soft limit per channel; 0 disables the check.
    max_listeners: AtomicUsize,
    /// Total number of `fire` calls.
    fire_count: AtomicUsize,
    /// Number of listener failures seen.
    failure_count: AtomicUsize,
}

impl ChannelRegistry {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self::with_max_listeners(label, 0)
    }

    pub fn with_max_listeners(label: impl Into<Arc<str>>, max_listeners: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                label: label.into(),
                channels: DashMap::new(),
                added_hooks: RwLock::new(Vec::new()),
                removed_hooks: RwLock::new(Vec::new()),
                error_hooks: RwLock::new(Vec::new()),
                max_listeners: AtomicUsize::new(max_listeners),
                fire_count: AtomicUsize::new(0),
                failure_count: AtomicUsize::new(0),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Registers `listener` under the exact channel `name`.
    pub fn subscribe(&self, name: &str, listener: Listener) -> &Self {
        self.add(name, listener, false)
    }

    /// Registers `listener` to run on the next fire of `name` only.
    ///
    /// The listener is removed before it runs.
    pub fn subscribe_once(&self, name: &str, listener: Listener) -> &Self {
        self.add(name, listener, true)
    }

    /// Removes `listener` from `name`, or every listener of `name` when
    /// `listener` is `None`.
    ///
    /// When the same listener was registered several times, only the most
    /// recent registration is removed.
    pub fn unsubscribe(&self, name: &str, listener: Option<&Listener>) -> &Self {
        let removed = match self.inner.channels.get_mut(name) {
            Some(mut list) => match listener {
                Some(l) => list.remove(l).into_iter().collect(),
                None => list.clear(),
            },
            None => Vec::new(),
        };
        self.inner.channels.remove_if(name, |_, list| list.is_empty());

        debug!(
            registry = %self.inner.label,
            channel = name,
            removed = removed.len(),
            "Listeners removed"
        );
        for entry in &removed {
            self.notify_removed(name, &entry.listener);
        }
        self
    }

    /// Invokes every listener registered under `name` with `args`.
    ///
    /// Returns the number of listeners invoked. Listener errors are reported
    /// to the error hooks and do not stop delivery.
    pub fn fire(&self, name: &str, args: &[Value]) -> usize {
        self.inner.fire_count.fetch_add(1, Ordering::Relaxed);

        let snapshot = match self.inner.channels.get(name) {
            Some(list) => list.snapshot(),
            None => {
                trace!(registry = %self.inner.label, channel = name, "Fire without listeners");
                return 0;
            }
        };

        let invoked = deliver(
            snapshot,
            args,
            |id| self.claim_once(name, id),
            |error| {
                self.report_failure(ListenerFailure {
                    registry: Arc::clone(&self.inner.label),
                    channel: name.to_string(),
                    namespace: None,
                    error,
                })
            },
        );

        trace!(
            registry = %self.inner.label,
            channel = name,
            invoked,
            "Channel fired"
        );
        invoked
    }

    /// Number of listeners currently registered under `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner.channels.get(name).map_or(0, |l| l.len())
    }

    /// Snapshot of the listeners registered under `name`, in order.
    pub fn listeners(&self, name: &str) -> Vec<Listener> {
        self.inner
            .channels
            .get(name)
            .map(|l| l.listeners())
            .unwrap_or_default()
    }

    /// Names of all channels that currently have listeners, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .channels
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn on_listener_added<F>(&self, hook: F) -> &Self
    where
        F: Fn(&str, &Listener) + Send + Sync + 'static,
    {
        self.inner.added_hooks.write().push(Arc::new(hook));
        self
    }

    pub fn on_listener_removed<F>(&self, hook: F) -> &Self
    where
        F: Fn(&str, &Listener) + Send + Sync + 'static,
    {
        self.inner.removed_hooks.write().push(Arc::new(hook));
        self
    }

    /// Installs a hook receiving every listener failure of this registry.
    ///
    /// Without any error hook, failures are logged at the level of their
    /// status code, with the error's metrics tags.
    pub fn on_listener_error<F>(&self, hook: F) -> &Self
    where
        F: Fn(&ListenerFailure) + Send + Sync + 'static,
    {
        self.inner.error_hooks.write().push(Arc::new(hook));
        self
    }

    pub fn set_max_listeners(&self, max: usize) -> &Self {
        self.inner.max_listeners.store(max, Ordering::Relaxed);
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.inner.max_listeners.load(Ordering::Relaxed)
    }

    pub fn fire_count(&self) -> usize {
        self.inner.fire_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> usize {
        self.inner.failure_count.load(Ordering::Relaxed)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn report_failure(&self, failure: ListenerFailure) {
        self.inner.failure_count.fetch_add(1, Ordering::Relaxed);

        let hooks = self.inner.error_hooks.read().clone();
        if hooks.is_empty() {
            let tags = failure
                .error
                .metrics_tags()
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            macro_rules! unhandled {
                ($level:ident) => {
                    $level!(
                        registry = %failure.registry,
                        channel = %failure.channel,
                        namespace = failure.namespace.as_deref().unwrap_or(""),
                        tags = %tags,
                        error = %failure.error,
                        "Unhandled listener error"
                    )
                };
            }
            match failure.error.log_level() {
                LogLevel::Info => unhandled!(info),
                LogLevel::Warn => unhandled!(warn),
                LogLevel::Error => unhandled!(error),
            }
            return;
        }
        for hook in hooks {
            hook(&failure);
        }
    }

    fn add(&self, name: &str, listener: Listener, once: bool) -> &Self {
        let max = self.max_listeners();
        {
            let mut list = self
                .inner
                .channels
                .entry(Arc::from(name))
                .or_default();
            list.push(listener.clone(), once);

            if max > 0 && list.len() > max && !list.leak_warned {
                list.leak_warned = true;
                warn!(
                    registry = %self.inner.label,
                    channel = name,
                    count = list.len(),
                    max,
                    "Possible listener leak: channel exceeds max listeners"
                );
            }
        }

        debug!(registry = %self.inner.label, channel = name, once, "Listener added");
        let hooks = self.inner.added_hooks.read().clone();
        for hook in hooks {
            hook(name, &listener);
        }
        self
    }

    fn claim_once(&self, name: &str, id: u64) -> bool {
        let claimed = self
            .inner
            .channels
            .get_mut(name)
            .and_then(|mut list| list.claim(id));
        let Some(entry) = claimed else {
            return false;
        };
        self.inner.channels.remove_if(name, |_, list| list.is_empty());
        self.notify_removed(name, &entry.listener);
        true
    }

    fn notify_removed(&self, name: &str, listener: &Listener) {
        let hooks = self.inner.removed_hooks.read().clone();
        for hook in hooks {
            hook(name, listener);
        }
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("label", &self.inner.label)
            .field("channels", &self.inner.channels.len())
            .field("fire_count", &self.fire_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use nshub_error::{bail, StatusCode};
    use serde_json::json;
    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::logging::capture::capture_logs;

    const LEAK: &str = "Possible listener leak";

    /// Helper: a listener that records its arguments under `tag`.
    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener {
        let log = Arc::clone(log);
        Listener::infallible(move |args: &Args| {
            log.lock().unwrap().push(format!("{tag}:{}", Value::from(args.to_vec())));
        })
    }

    /// Test verifies that listeners run in registration order with the fired args.
    #[test]
    fn test_fire_in_registration_order() {
        let reg = ChannelRegistry::new("action");
        let log = Arc::new(Mutex::new(Vec::new()));
        reg.subscribe("chan", recorder(&log, "a"))
            .subscribe("chan", recorder(&log, "b"));

        let invoked = reg.fire("chan", &[json!(1), json!("x")]);

        assert_eq!(invoked, 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:[1,\"x\"]", "b:[1,\"x\"]"]);
        assert_eq!(reg.fire_count(), 1);
    }

    /// Test verifies that firing a channel without listeners does not create it.
    #[test]
    fn test_fire_nonexistent_channel() {
        let reg = ChannelRegistry::new("action");
        assert_eq!(reg.fire("nochan", &[]), 0);
        assert!(reg.channel_names().is_empty());
        assert_eq!(reg.fire_count(), 1);
    }

    #[test]
    fn test_subscribe_once_fires_once() {
        let reg = ChannelRegistry::new("event");
        let log = Arc::new(Mutex::new(Vec::new()));
        reg.subscribe_once("chan", recorder(&log, "once"));

        reg.fire("chan", &[]);
        reg.fire("chan", &[]);

        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(reg.listener_count("chan"), 0);
        assert!(reg.channel_names().is_empty());
    }

    /// Test verifies that a once listener fired re-entrantly from itself runs once.
    #[test]
    fn test_once_reentrant() {
        let reg = ChannelRegistry::new("action");
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_c = Arc::clone(&hits);
        let reg_c = reg.clone();
        reg.subscribe_once(
            "chan",
            Listener::infallible(move |_| {
                hits_c.fetch_add(1, Ordering::SeqCst);
                reg_c.fire("chan", &[]);
            }),
        );

        reg.fire("chan", &[]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_specific_and_all() {
        let reg = ChannelRegistry::new("action");
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        reg.subscribe("chan", a.clone()).subscribe("chan", b.clone());

        reg.unsubscribe("chan", Some(&a));
        reg.fire("chan", &[]);
        assert_eq!(*log.lock().unwrap(), vec!["b:[]"]);

        reg.subscribe("chan", a);
        reg.unsubscribe("chan", None);
        assert_eq!(reg.fire("chan", &[]), 0);
        assert_eq!(reg.listener_count("chan"), 0);
    }

    /// Test verifies that removing an unknown listener or channel is a no-op.
    #[test]
    fn test_unsubscribe_nonexistent() {
        let reg = ChannelRegistry::new("action");
        let stray: Listener = Listener::infallible(|_| {});
        reg.unsubscribe("nochan", None);
        reg.unsubscribe("nochan", Some(&stray));
        reg.subscribe("chan", Listener::infallible(|_| {}));
        reg.unsubscribe("chan", Some(&stray));
        assert_eq!(reg.listener_count("chan"), 1);
    }

    /// Test verifies that the snapshot taken at fire start is honoured:
    /// a listener added during the fire does not run, a listener removed
    /// during the fire still does.
    #[test]
    fn test_snapshot_semantics() {
        let reg = ChannelRegistry::new("action");
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = recorder(&log, "late");
        let second = recorder(&log, "second");

        let reg_c = reg.clone();
        let late_c = late.clone();
        let second_c = second.clone();
        reg.subscribe(
            "chan",
            Listener::infallible(move |_| {
                reg_c.subscribe("chan", late_c.clone());
                reg_c.unsubscribe("chan", Some(&second_c));
            }),
        );
        reg.subscribe("chan", second);

        assert_eq!(reg.fire("chan", &[]), 2);
        assert_eq!(*log.lock().unwrap(), vec!["second:[]"]);

        log.lock().unwrap().clear();
        reg.fire("chan", &[]);
        assert_eq!(*log.lock().unwrap(), vec!["late:[]"]);
    }

    #[test]
    fn test_added_and_removed_hooks() {
        let reg = ChannelRegistry::new("action");
        let events = Arc::new(Mutex::new(Vec::new()));
        let added = Arc::clone(&events);
        let removed = Arc::clone(&events);
        reg.on_listener_added(move |name, _| added.lock().unwrap().push(format!("+{name}")))
            .on_listener_removed(move |name, _| removed.lock().unwrap().push(format!("-{name}")));

        let l: Listener = Listener::infallible(|_| {});
        reg.subscribe("a", l.clone());
        reg.subscribe_once("b", l.clone());
        reg.fire("b", &[]);
        reg.unsubscribe("a", Some(&l));

        assert_eq!(*events.lock().unwrap(), vec!["+a", "+b", "-b", "-a"]);
    }

    /// Test verifies that listener errors reach the error hook and do not
    /// block later listeners.
    #[test]
    fn test_listener_error_isolated() {
        let reg = ChannelRegistry::new("event");
        let failures = Arc::new(Mutex::new(Vec::new()));
        let failures_c = Arc::clone(&failures);
        reg.on_listener_error(move |f| {
            failures_c
                .lock()
                .unwrap()
                .push((f.channel.clone(), f.error.status_code()))
        });

        let log = Arc::new(Mutex::new(Vec::new()));
        reg.subscribe("chan", Listener::new(|_| bail!(StatusCode::InvalidArgs, "bad")))
            .subscribe("chan", recorder(&log, "after"));

        assert_eq!(reg.fire("chan", &[]), 2);
        assert_eq!(*log.lock().unwrap(), vec!["after:[]"]);
        assert_eq!(
            *failures.lock().unwrap(),
            vec![("chan".to_string(), StatusCode::InvalidArgs)]
        );
        assert_eq!(reg.failure_count(), 1);
    }

    #[test]
    fn test_channel_names_sorted() {
        let reg = ChannelRegistry::with_max_listeners("action", 10);
        reg.subscribe("b:x", Listener::infallible(|_| {}))
            .subscribe("a", Listener::infallible(|_| {}));
        assert_eq!(reg.channel_names(), vec!["a", "b:x"]);
        assert_eq!(reg.max_listeners(), 10);
    }

    /// Test verifies that exceeding the limit warns once per channel, however
    /// many listeners follow.
    #[test]
    fn test_leak_warning_once_per_channel() {
        let reg = ChannelRegistry::with_max_listeners("action", 2);
        let out = capture_logs(EnvFilter::new("warn"), || {
            for _ in 0..5 {
                reg.subscribe("a", Listener::infallible(|_| {}));
            }
            for _ in 0..3 {
                reg.subscribe("b", Listener::infallible(|_| {}));
            }
            reg.subscribe("c", Listener::infallible(|_| {}));
        });

        let warnings: Vec<&str> = out.lines().filter(|l| l.contains(LEAK)).collect();
        assert_eq!(warnings.len(), 2, "got: {out}");
        assert!(warnings[0].contains("WARN"));
        assert!(warnings[0].contains("count=3"));
        assert!(warnings[1].contains("count=3"));
        assert_eq!(reg.listener_count("a"), 5);
    }

    #[test]
    fn test_no_leak_warning_when_unlimited() {
        let reg = ChannelRegistry::new("event");
        let out = capture_logs(EnvFilter::new("warn"), || {
            for _ in 0..20 {
                reg.subscribe("a", Listener::infallible(|_| {}));
            }
        });

        assert!(!out.contains(LEAK), "got: {out}");
        assert_eq!(reg.listener_count("a"), 20);
    }

    /// Test verifies that unhandled failures are logged at the level of their
    /// status code and carry the error's tags.
    #[test]
    fn test_unhandled_failure_level_and_tags() {
        let reg = ChannelRegistry::new("action");
        reg.subscribe("x", Listener::new(|_| bail!(StatusCode::InvalidArgs, "bad input")))
            .subscribe("y", Listener::new(|_| bail!(StatusCode::ListenerFailed, "boom")));

        let out = capture_logs(EnvFilter::new("info"), || {
            reg.fire("x", &[]);
            reg.fire("y", &[]);
        });

        let line = |needle: &str| {
            out.lines()
                .find(|l| l.contains(needle))
                .map(str::to_string)
                .unwrap_or_default()
        };
        let caller = line("bad input");
        let listener = line("boom");
        assert!(caller.contains("INFO"), "got: {caller}");
        assert!(listener.contains("ERROR"), "got: {listener}");
        assert!(caller.contains("error_type=GenericError"));
        assert!(listener.contains("status_code=ListenerFailed (5000)"));

        let quiet = capture_logs(EnvFilter::new("warn"), || {
            reg.fire("x", &[]);
        });
        assert!(!quiet.contains("bad input"));
        assert_eq!(reg.failure_count(), 3);
    }
}
