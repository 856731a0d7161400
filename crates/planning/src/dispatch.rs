use std::sync::Arc;

use async_trait::async_trait;
use contracts::Fact;

/// Side-effect seam. Implementations persist notifications, broadcast over
/// the realtime layer, or both. The engine calls it only after the
/// authoritative write has committed and never fails an operation because
/// a dispatch failed.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, fact: Fact) -> anyhow::Result<()>;
}

/// Fan a batch of facts out, logging and swallowing individual failures.
pub async fn fan_out(dispatcher: &Arc<dyn Dispatcher>, facts: Vec<Fact>) {
    for fact in facts {
        if let Err(e) = dispatcher.dispatch(fact).await {
            tracing::warn!("failed to dispatch side-effect fact: {}", e);
        }
    }
}

/// Default wiring aid: traces each fact and does nothing else.
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn dispatch(&self, fact: Fact) -> anyhow::Result<()> {
        tracing::info!("side-effect fact: {:?}", fact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingDispatcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Dispatcher for FailingDispatcher {
        async fn dispatch(&self, _fact: Fact) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("broadcast down"))
        }
    }

    fn fact(activity_id: i64) -> Fact {
        Fact::ActivityCreated {
            trip_id: 1,
            activity_id,
            subject_user_id: 1,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fan_out_swallows_failures_and_delivers_all() {
        let inner = Arc::new(FailingDispatcher {
            calls: AtomicUsize::new(0),
        });
        let dispatcher: Arc<dyn Dispatcher> = inner.clone();

        fan_out(&dispatcher, vec![fact(1), fact(2), fact(3)]).await;

        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }
}
