//! Example using `#[derive(Injectable)]`
//!
//! ```bash
//! cargo run --example derive --features derive
//! ```

use scoped_injector::{Inject, Injectable, Injector, Module};

struct Database {
    url: String,
}

struct Cache {
    size: usize,
}

#[derive(Default, Injectable)]
struct Repository {
    #[inject]
    db: Inject<Database>,
    #[inject]
    #[named("replica")]
    replica: Inject<Database>,
}

#[derive(Default, Injectable)]
struct UserService {
    #[inject(optional)]
    cache: Inject<Cache>,
    #[inject(base)]
    repository: Repository,
    // not injected
    request_count: u64,
}

fn main() {
    let module = Module::new();
    module.singleton(Database {
        url: "postgres://primary".into(),
    });
    module.named_singleton(
        "replica",
        Database {
            url: "postgres://replica".into(),
        },
    );
    module.singleton(Cache { size: 1024 });
    module.prototype(UserService::default);

    let injector = Injector::new(module);
    let service = injector.get::<UserService>().unwrap();

    println!("primary: {}", service.repository.db.get().unwrap().url);
    println!("replica: {}", service.repository.replica.get().unwrap().url);
    println!(
        "cache:   {:?}",
        service.cache.get().map(|cache| cache.size)
    );
    println!("requests handled: {}", service.request_count);
}
