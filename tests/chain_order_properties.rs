//! Property tests for chain ordering and abort behaviour
//!
//! An eight-layer chain is assembled by nesting a generic wrapper around a
//! leaf. The layer `d` levels above the leaf runs at position `d`.

use std::sync::{Arc, Mutex};

use cim_chain::{build, Layer, LayerSchema, Link, TypedArguments};
use proptest::prelude::*;

/// What every layer does when its turn comes
#[derive(Clone)]
struct Script {
    abort_at: Option<usize>,
    stop_at: Option<usize>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Script {
    fn record(&self, entry: String) {
        self.log.lock().expect("log lock").push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }
}

trait Depth {
    const DEPTH: usize;
}

fn step<L>(link: &mut Link<'_, L>, depth: usize, script: Script)
where
    L: 'static,
{
    script.record(format!("enter {depth}"));
    if script.abort_at == Some(depth) {
        link.abort_with(format!("abort {depth}"));
        return;
    }
    if script.stop_at == Some(depth) {
        return;
    }
    link.next();
    script.record(format!("leave {depth}"));
}

#[derive(Default)]
struct Leaf;

impl Depth for Leaf {
    const DEPTH: usize = 0;
}

impl Leaf {
    fn run(link: &mut Link<'_, Self>, script: Script) {
        step(link, Self::DEPTH, script);
    }
}

impl Layer for Leaf {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.method("Run", Self::run);
    }
}

/// Embeds `C`, which therefore runs first
#[derive(Default)]
struct Wrap<C> {
    inner: C,
}

impl<C: Depth> Depth for Wrap<C> {
    const DEPTH: usize = C::DEPTH + 1;
}

impl<C: Layer + Depth> Wrap<C> {
    fn run(link: &mut Link<'_, Self>, script: Script) {
        step(link, Self::DEPTH, script);
    }
}

impl<C: Layer + Depth> Layer for Wrap<C> {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.embed("inner", |w| &mut w.inner).method("Run", Self::run);
    }
}

type Eight = Wrap<Wrap<Wrap<Wrap<Wrap<Wrap<Wrap<Leaf>>>>>>>;

fn expected(len: usize, abort_at: Option<usize>, stop_at: Option<usize>) -> Vec<String> {
    let last_entered = [abort_at, stop_at, Some(len - 1)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(len - 1);

    let mut entries: Vec<String> = (0..=last_entered).map(|d| format!("enter {d}")).collect();
    let left = if last_entered == len - 1 && abort_at != Some(last_entered) && stop_at != Some(last_entered) {
        // The terminal step calls next on an exhausted chain and leaves normally
        (0..=last_entered).rev().collect::<Vec<_>>()
    } else {
        (0..last_entered).rev().collect::<Vec<_>>()
    };
    entries.extend(left.into_iter().map(|d| format!("leave {d}")));
    entries
}

fn run_chain(abort_at: Option<usize>, stop_at: Option<usize>) -> (Vec<String>, Option<String>) {
    let chain = build::<Eight>("Run").expect("chain builds");
    let script = Script {
        abort_at,
        stop_at,
        log: Arc::default(),
    };
    let result = chain.call(&mut TypedArguments::new().value(script.clone()));
    (script.entries(), result.err().map(|err| err.to_string()))
}

#[test]
fn test_full_chain_runs_in_depth_order() {
    let (entries, err) = run_chain(None, None);
    assert_eq!(entries, expected(8, None, None));
    assert!(err.is_none());
}

proptest! {
    #[test]
    fn prop_abort_at_k_stops_later_methods(k in 0usize..8) {
        let (entries, err) = run_chain(Some(k), None);

        prop_assert_eq!(&entries, &expected(8, Some(k), None));
        prop_assert_eq!(err, Some(format!("abort {k}")));
        for later in (k + 1)..8 {
            let entered = format!("enter {later}");
            prop_assert!(!entries.contains(&entered));
        }
    }

    #[test]
    fn prop_skipping_next_runs_no_inner_method(k in 0usize..8) {
        let (entries, err) = run_chain(None, Some(k));

        prop_assert_eq!(&entries, &expected(8, None, Some(k)));
        prop_assert!(err.is_none());
    }

    #[test]
    fn prop_earliest_abort_or_stop_decides(a in 0usize..8, s in 0usize..8) {
        let (entries, err) = run_chain(Some(a), Some(s));

        if a <= s {
            prop_assert_eq!(err, Some(format!("abort {a}")));
        } else {
            prop_assert!(err.is_none());
        }
        let entered = entries.iter().filter(|e| e.starts_with("enter")).count();
        prop_assert_eq!(entered, a.min(s) + 1);
    }
}
