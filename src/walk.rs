//! Subtree walks built from repeated GETNEXT.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, Result};
use crate::handler::BoxFuture;
use crate::mib::MibStore;
use crate::oid::Oid;
use crate::varbind::VarBind;

/// Default cap on the number of bindings a manager walk returns.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Anything that can answer "what comes after this OID".
///
/// Implementations return [`Error::EndOfMib`] when nothing follows; the
/// walk treats that as normal termination.
pub trait NextSource: Send + Sync + 'static {
    fn next_after<'a>(&'a self, oid: &'a Oid) -> BoxFuture<'a, Result<VarBind>>;
}

impl NextSource for MibStore {
    fn next_after<'a>(&'a self, oid: &'a Oid) -> BoxFuture<'a, Result<VarBind>> {
        let result = self
            .get_next(oid)
            .map(|entry| VarBind::new(entry.oid, entry.value));
        Box::pin(async move { result })
    }
}

impl<S: NextSource + ?Sized> NextSource for Arc<S> {
    fn next_after<'a>(&'a self, oid: &'a Oid) -> BoxFuture<'a, Result<VarBind>> {
        (**self).next_after(oid)
    }
}

type Pending = Pin<Box<dyn Future<Output = Result<VarBind>> + Send>>;

/// Async stream over the bindings under a root OID.
///
/// Each step asks the source for the successor of the last OID returned,
/// starting from the root. The walk ends, without yielding the offending
/// binding, when:
///
/// - the source reports end of MIB or fails,
/// - the returned OID is outside the root subtree,
/// - the returned OID does not increase (misbehaving agent), or
/// - `max_results` bindings have been yielded.
///
/// A walk is finite and cannot be restarted. If it ended on a failure,
/// [`Walk::error`] reports it.
pub struct Walk<S: NextSource> {
    source: Arc<S>,
    root: Oid,
    current: Oid,
    last_returned: Option<Oid>,
    max_results: usize,
    emitted: usize,
    done: bool,
    error: Option<Error>,
    pending: Option<Pending>,
}

impl<S: NextSource> Walk<S> {
    /// Walk the subtree under `root`, yielding at most `max_results` bindings.
    pub fn new(source: Arc<S>, root: Oid, max_results: usize) -> Self {
        Self {
            source,
            current: root.clone(),
            root,
            last_returned: None,
            max_results,
            emitted: 0,
            done: false,
            error: None,
            pending: None,
        }
    }

    /// The root OID.
    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// The failure that ended the walk, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Take ownership of the failure that ended the walk.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Whether the walk has finished.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of bindings yielded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Next binding, or `None` when the walk has ended.
    pub async fn next_varbind(&mut self) -> Option<VarBind> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Drive the walk to completion.
    ///
    /// Returns every binding, or the failure that cut the walk short.
    pub async fn collect_all(mut self) -> Result<Vec<VarBind>> {
        let mut out = Vec::new();
        while let Some(vb) = self.next_varbind().await {
            out.push(vb);
        }
        match self.error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    fn finish(&mut self, error: Option<Error>) -> Poll<Option<VarBind>> {
        if let Some(e) = &error {
            tracing::debug!(snmp.root = %self.root, error = %e, "walk ended on error");
        }
        self.done = true;
        self.error = error;
        Poll::Ready(None)
    }
}

impl<S: NextSource> Stream for Walk<S> {
    type Item = VarBind;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if this.emitted >= this.max_results {
            return this.finish(None);
        }

        let pending = match &mut this.pending {
            Some(pending) => pending,
            slot @ None => {
                let source = Arc::clone(&this.source);
                let oid = this.current.clone();
                slot.insert(Box::pin(async move { source.next_after(&oid).await }))
            }
        };

        let result = match pending.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };
        this.pending = None;

        let vb = match result {
            Ok(vb) => vb,
            Err(Error::EndOfMib { .. }) => return this.finish(None),
            Err(e) => return this.finish(Some(e)),
        };

        if !vb.oid.starts_with(&this.root) {
            return this.finish(None);
        }

        if let Some(previous) = this.last_returned.take()
            && vb.oid <= previous
        {
            return this.finish(Some(Error::NonIncreasingOid {
                previous,
                current: vb.oid,
            }));
        }

        this.current = vb.oid.clone();
        this.last_returned = Some(vb.oid.clone());
        this.emitted += 1;
        Poll::Ready(Some(vb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::mib::{MibSeed, oids};
    use crate::oid;
    use crate::value::Value;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    fn store() -> Arc<MibStore> {
        Arc::new(MibStore::seeded(&MibSeed::default(), system_clock()))
    }

    /// Replays a fixed list of answers regardless of the requested OID.
    struct Script(Mutex<VecDeque<Result<VarBind>>>);

    impl Script {
        fn new(answers: Vec<Result<VarBind>>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(answers.into())))
        }
    }

    impl NextSource for Script {
        fn next_after<'a>(&'a self, oid: &'a Oid) -> BoxFuture<'a, Result<VarBind>> {
            let next = self
                .0
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(Error::EndOfMib { oid: oid.clone() }));
            Box::pin(async move { next })
        }
    }

    #[tokio::test]
    async fn test_walk_if_index_column_stays_in_subtree() {
        let walk = Walk::new(store(), oids::if_index(), 50);
        let oids: Vec<_> = walk
            .collect_all()
            .await
            .unwrap()
            .into_iter()
            .map(|vb| vb.oid)
            .collect();
        assert_eq!(oids, vec![oids::if_index().child(1), oids::if_index().child(2)]);
    }

    #[tokio::test]
    async fn test_walk_respects_max_results() {
        let mut walk = Walk::new(store(), oid!(1, 3, 6, 1, 2, 1), 3);
        let mut seen = Vec::new();
        while let Some(vb) = walk.next_varbind().await {
            seen.push(vb.oid);
        }
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert!(walk.is_done());
        assert!(walk.error().is_none());
    }

    #[tokio::test]
    async fn test_walk_zero_max_yields_nothing() {
        let walk = Walk::new(store(), oid!(1, 3, 6, 1), 0);
        assert!(walk.collect_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_walk_whole_store_ends_at_end_of_mib() {
        let store = store();
        let walk = Walk::new(Arc::clone(&store), oid!(1), usize::MAX);
        assert_eq!(walk.collect_all().await.unwrap().len(), store.len());
    }

    #[tokio::test]
    async fn test_walk_stops_on_non_increasing_oid() {
        let root = oid!(1, 3, 6, 1, 2, 1, 1);
        let source = Script::new(vec![
            Ok(VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("a"))),
            Ok(VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("b"))),
        ]);
        let mut walk = Walk::new(source, root, 50);
        assert!(walk.next_varbind().await.is_some());
        assert!(walk.next_varbind().await.is_none());
        assert!(matches!(walk.error(), Some(Error::NonIncreasingOid { .. })));
        // Finished walks stay finished.
        assert!(walk.next_varbind().await.is_none());
    }

    #[tokio::test]
    async fn test_walk_error_is_retained() {
        let source = Script::new(vec![
            Ok(VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("a"))),
            Err(Error::indication(None, "agent unreachable")),
        ]);
        let walk = Walk::new(source, oid!(1, 3, 6, 1, 2, 1, 1), 50);
        let err = walk.collect_all().await.unwrap_err();
        assert!(matches!(err, Error::Indication { .. }));
    }

    #[tokio::test]
    async fn test_walk_prefix_is_arc_wise() {
        let source = Script::new(vec![Ok(VarBind::new(
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1),
            Value::Counter32(1),
        ))]);
        let walk = Walk::new(source, oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1), 50);
        assert!(walk.collect_all().await.unwrap().is_empty());
    }
}
