//! Concurrent executions and registry use
//!
//! ```mermaid
//! sequenceDiagram
//!     participant A as Execution A
//!     participant B as Execution B
//!     A->>A: Gate waits at barrier
//!     B->>B: Gate waits at barrier
//!     A->>A: Abort("denied")
//!     B->>B: Handler completes
//! ```

use std::sync::{Arc, Barrier};
use std::thread;

use cim_chain::{
    ChainError, ChainFn, ChainRegistry, Layer, LayerSchema, Link, NoArguments, TypedArguments,
};

#[derive(Clone)]
struct Verdict {
    allow: bool,
    barrier: Arc<Barrier>,
}

#[derive(Default)]
struct Gate {
    passed: bool,
}

impl Gate {
    fn post(link: &mut Link<'_, Self>, verdict: Verdict) {
        // Both executions are inside the chain before either decides
        verdict.barrier.wait();
        if !verdict.allow {
            link.abort_with("denied");
            return;
        }
        link.recv().passed = true;
        link.next();
    }
}

impl Layer for Gate {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.method("POST", Self::post);
    }
}

#[derive(Default)]
struct Orders {
    gate: Gate,
}

impl Orders {
    fn post(link: &mut Link<'_, Self>) {
        assert!(!link.is_aborted());
        assert!(link.err().is_none());
        if !link.recv().gate.passed {
            link.abort_with("gate state leaked between executions");
        }
    }
}

impl Layer for Orders {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.embed("gate", |o| &mut o.gate).method("POST", Self::post);
    }
}

fn run(chain: &ChainFn<Orders>, allow: bool, barrier: &Arc<Barrier>) -> Result<(), ChainError> {
    let mut args = TypedArguments::new().value(Verdict {
        allow,
        barrier: Arc::clone(barrier),
    });
    chain.call(&mut args)
}

#[test]
fn test_aborting_one_execution_leaves_the_other_running() {
    let chain = cim_chain::build::<Orders>("POST").expect("chain builds");

    for _ in 0..16 {
        let barrier = Arc::new(Barrier::new(2));
        let (denied, allowed) = thread::scope(|scope| {
            let denied = scope.spawn(|| run(&chain, false, &barrier));
            let allowed = scope.spawn(|| run(&chain, true, &barrier));
            (
                denied.join().expect("thread finished"),
                allowed.join().expect("thread finished"),
            )
        });

        assert_eq!(denied.unwrap_err().to_string(), "denied");
        assert!(allowed.is_ok());
    }
}

#[derive(Default)]
struct Ping;

impl Ping {
    fn get(_link: &mut Link<'_, Self>) {}
}

impl Layer for Ping {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.method("GET", Self::get);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registry_publishes_one_chain_per_key() {
    let registry = Arc::new(ChainRegistry::new());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let chain = registry.get_or_build::<Ping>("GET").expect("chain builds");
            chain.call(&mut NoArguments).expect("chain runs");
            registry
                .get_or_build::<Ping>("PUT")
                .expect_err("Ping has no PUT")
                .is_empty_chain()
        }));
    }

    for handle in handles {
        assert!(handle.await.expect("task finished"));
    }

    assert_eq!(registry.len(), 2);
    let first = registry.get_or_build::<Ping>("GET").expect("cached");
    let second = registry.get_or_build::<Ping>("GET").expect("cached");
    assert!(std::ptr::eq(first.descriptor(), second.descriptor()));
}

#[test]
fn test_chain_fn_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ChainFn<Orders>>();
    assert_send_sync::<ChainRegistry>();
}
