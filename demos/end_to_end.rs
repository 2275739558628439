//! Logger / Worker / Metrics walkthrough
//!
//! ```bash
//! cargo run --example end_to_end
//! ```

use scoped_injector::{Inject, Injectable, InjectionPoints, Injector, Module};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WORKER: AtomicU64 = AtomicU64::new(1);

struct Logger;

impl Logger {
    fn log(&self, msg: &str) {
        println!("  [log] {msg}");
    }
}

struct Metrics;

struct Worker {
    id: u64,
    logger: Inject<Logger>,
    metrics: Inject<Metrics>,
}

impl Worker {
    fn new() -> Self {
        Self {
            id: NEXT_WORKER.fetch_add(1, Ordering::Relaxed),
            logger: Inject::new(),
            metrics: Inject::new(),
        }
    }

    fn run(&self) {
        if let Some(logger) = self.logger.get() {
            logger.log(&format!("worker {} running", self.id));
        }
    }
}

impl Injectable for Worker {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("logger", |w: &Worker| &w.logger);
        points.field("metrics", |w: &Worker| &w.metrics).optional();
    }
}

fn main() {
    let module = Module::new();
    module.singleton(Logger);
    module.prototype(Worker::new);

    let injector = Injector::new(module);

    let first = injector.get::<Worker>().unwrap();
    let second = injector.get::<Worker>().unwrap();
    first.run();
    second.run();

    println!("distinct workers:     {}", !Arc::ptr_eq(&first, &second));
    println!(
        "shared logger:        {}",
        Arc::ptr_eq(&first.logger.get().unwrap(), &second.logger.get().unwrap())
    );
    println!("metrics left unset:   {}", first.metrics.get().is_none());

    // a request scope sees the root's bindings and caches what it resolved
    let request = injector.child(Module::new());
    let worker = request.get::<Worker>().unwrap();
    worker.run();
    println!("request scope cached: {} instance(s)", request.cached_len());
}
