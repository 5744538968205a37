//! Continuation passed to each chain link.

use std::cell::Cell;
use std::sync::Arc;

use crate::chain::middleware::Middleware;
use crate::context::Context;

/// The rest of the chain after the current link.
///
/// Consumed by [`Next::run`], so a link can resume downstream at most once.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    resumed: &'a Cell<bool>,
}

impl<'a> Next<'a> {
    /// Run every remaining link, returning once they have finished or the
    /// chain was aborted.
    pub fn run(self, ctx: &mut Context) {
        self.resumed.set(true);
        run(self.rest, ctx);
    }

    /// Links still ahead of the current one.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Drive `chain` in order until it ends or the context is aborted.
///
/// When a link resumes the chain itself, its `Next::run` call already ran
/// the tail, so the loop stops there instead of running it twice.
pub(crate) fn run(chain: &[Arc<dyn Middleware>], ctx: &mut Context) {
    let mut rest = chain;
    while let Some((link, tail)) = rest.split_first() {
        if ctx.is_aborted() {
            return;
        }
        let resumed = Cell::new(false);
        link.handle(
            ctx,
            Next {
                rest: tail,
                resumed: &resumed,
            },
        );
        if resumed.get() {
            return;
        }
        rest = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, entry: &str) {
        log.lock().unwrap().push(entry.to_string());
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn link<F>(f: F) -> Arc<dyn Middleware>
    where
        F: Fn(&mut Context, Next<'_>) + Send + Sync + 'static,
    {
        Arc::new(crate::chain::from_fn(f))
    }

    #[test]
    fn test_links_run_in_order_without_next() {
        let log = Log::default();
        let chain: Vec<Arc<dyn Middleware>> = (0..3)
            .map(|i| {
                let log = log.clone();
                link(move |_ctx, _next| record(&log, &format!("m{}", i)))
            })
            .collect();

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert_eq!(entries(&log), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_next_wraps_downstream() {
        let log = Log::default();
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let chain = vec![
            link(move |ctx, next| {
                record(&l1, "outer:before");
                next.run(ctx);
                record(&l1, "outer:after");
            }),
            link(move |ctx, next| {
                record(&l2, "inner:before");
                next.run(ctx);
                record(&l2, "inner:after");
            }),
            link(move |_ctx, _next| record(&l3, "handler")),
        ];

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert_eq!(
            entries(&log),
            vec![
                "outer:before",
                "inner:before",
                "handler",
                "inner:after",
                "outer:after"
            ]
        );
    }

    #[test]
    fn test_handler_runs_exactly_once_when_next_called() {
        let log = Log::default();
        let (l1, l2) = (log.clone(), log.clone());
        let chain = vec![
            link(move |ctx, next| {
                next.run(ctx);
                record(&l1, "after");
            }),
            link(move |_ctx, _next| record(&l2, "handler")),
        ];

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert_eq!(entries(&log), vec!["handler", "after"]);
    }

    #[test]
    fn test_abort_skips_later_links_but_finishes_current() {
        let log = Log::default();
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let chain = vec![
            link(move |ctx, next| {
                record(&l1, "first:before");
                next.run(ctx);
                record(&l1, "first:after");
            }),
            link(move |ctx, _next| {
                ctx.abort();
                record(&l2, "aborter:after-abort");
            }),
            link(move |_ctx, _next| record(&l3, "never")),
        ];

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert!(ctx.is_aborted());
        assert_eq!(
            entries(&log),
            vec!["first:before", "aborter:after-abort", "first:after"]
        );
    }

    #[test]
    fn test_next_after_abort_runs_nothing() {
        let log = Log::default();
        let l2 = log.clone();
        let chain = vec![
            link(|ctx, next| {
                ctx.abort();
                next.run(ctx);
            }),
            link(move |_ctx, _next| record(&l2, "never")),
        ];

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_remaining_counts_tail() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let chain: Vec<Arc<dyn Middleware>> = (0..3)
            .map(|_| {
                let s = s.clone();
                link(move |_ctx, next| s.lock().unwrap().push(next.remaining()))
            })
            .collect();

        let mut ctx = Context::default();
        run(&chain, &mut ctx);
        assert_eq!(*seen.lock().unwrap(), vec![2, 1, 0]);
    }
}
