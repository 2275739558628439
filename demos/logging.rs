//! Example demonstrating logging capabilities
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-pretty,logging-json
//! ```

use scoped_injector::{Inject, Injectable, InjectionPoints, Injector, Module};

struct Database {
    url: String,
}

struct RequestContext {
    request_id: String,
}

#[derive(Default)]
struct Handler {
    db: Inject<Database>,
    ctx: Inject<RequestContext>,
}

impl Injectable for Handler {
    fn injection_points(points: &mut InjectionPoints<Self>) {
        points.field("db", |h: &Handler| &h.db);
        points.field("ctx", |h: &Handler| &h.ctx);
    }
}

fn main() {
    scoped_injector::logging::builder()
        .trace()
        .injector_only()
        .pretty()
        .init();

    println!("=== Scoped Injector Logging Demo ===\n");

    // logs: "Registering binding"
    let app = Module::new();
    app.singleton(Database {
        url: "postgres://localhost/mydb".into(),
    });
    app.lazy(|| {
        println!("  [App] Lazy default context being created...");
        RequestContext {
            request_id: "default".into(),
        }
    });

    // logs: "Creating injector scope"
    let root = Injector::new(app);

    let request = Module::new();
    request.singleton(RequestContext {
        request_id: "req-12345".into(),
    });
    request.prototype(Handler::default);
    let scope = root.child(request);

    // logs: "Wiring new prototype instance", "Not bound in this scope, delegating to parent"
    let handler = scope.get::<Handler>().unwrap();
    println!(
        "  handler wired: db={} request={}",
        handler.db.get().unwrap().url,
        handler.ctx.get().unwrap().request_id
    );

    // logs: "Instance resolved from scope cache"
    let _db = scope.get::<Database>().unwrap();

    // logs: "No binding in scope chain"
    assert!(scope.get_instance::<i32>().unwrap().is_none());

    println!("\n=== Demo Complete ===");
}
