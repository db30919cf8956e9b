//! Request dispatch by HTTP verb
//!
//! This demo shows:
//! - Composing a handler type from middleware layers
//! - Building one chain per verb with a catch-all `Any` method in middleware
//! - Supplying request data through typed arguments
//! - Aborting a request from middleware and mapping unsupported verbs to 405

use std::sync::{Arc, Mutex};

use cim_chain::{
    ChainBuilder, ChainConfig, ChainError, ChainSet, FallbackScope, Layer, LayerSchema, Link,
    TypedArguments,
};

#[derive(Debug, Clone)]
struct Request {
    verb: &'static str,
    path: &'static str,
    token: Option<&'static str>,
}

/// Lines written by the layers while a request is handled
#[derive(Debug, Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn write(&self, line: String) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(line);
        }
    }

    fn drain(&self) -> Vec<String> {
        self.0.lock().map(|mut lines| lines.drain(..).collect()).unwrap_or_default()
    }
}

/// Adds CORS headers to every response
#[derive(Debug, Clone, Default)]
struct Cors;

impl Cors {
    fn any(link: &mut Link<'_, Self>, journal: Journal) {
        journal.write("cors: allow-origin *".to_string());
        link.next();
    }
}

impl Layer for Cors {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.value_method("Any", Self::any);
    }
}

#[derive(Debug, Default)]
struct Auth {
    user: Option<String>,
}

impl Auth {
    fn any(link: &mut Link<'_, Self>, request: Request, journal: Journal) {
        let Some(token) = request.token else {
            journal.write("auth: rejected".to_string());
            link.abort_with("401 unauthorized");
            return;
        };
        journal.write(format!("auth: token {token}"));
        link.recv().user = Some(token.trim_start_matches("token-").to_string());
        link.next();
    }
}

impl Layer for Auth {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema.method("Any", Self::any);
    }
}

#[derive(Debug, Default)]
struct UsersHandler {
    cors: Cors,
    auth: Auth,
}

impl UsersHandler {
    fn get(link: &mut Link<'_, Self>, request: Request, journal: Journal) {
        let user = link.recv().auth.user.clone().unwrap_or_default();
        journal.write(format!("users: {} listed for {user}", request.path));
    }

    fn post(link: &mut Link<'_, Self>, request: Request, journal: Journal) {
        let user = link.recv().auth.user.clone().unwrap_or_default();
        journal.write(format!("users: {user} created an entry under {}", request.path));
    }
}

impl Layer for UsersHandler {
    fn compose(schema: &mut LayerSchema<Self>) {
        schema
            .embed("cors", |h| &mut h.cors)
            .embed("auth", |h| &mut h.auth)
            .method("GET", Self::get)
            .method("POST", Self::post);
    }
}

fn status(result: &Result<(), ChainError>) -> String {
    match result {
        Ok(()) => "200 ok".to_string(),
        Err(err) if err.is_empty_chain() => "405 method not allowed".to_string(),
        Err(err) => err.to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== HTTP verb dispatch ===\n");

    let config = ChainConfig::default().with_fallback(Some("Any"), FallbackScope::NestedLayers);
    let builder = ChainBuilder::<UsersHandler>::new().with_config(config);
    let handlers = ChainSet::build(&builder, ["GET", "POST", "PUT", "DELETE"])?;

    println!("Supported verbs: {:?}", handlers.selectors().collect::<Vec<_>>());
    for (verb, chain) in handlers.iter() {
        let steps: Vec<String> = chain
            .descriptor()
            .methods()
            .iter()
            .map(|m| format!("{}.{}", m.layer().short_name(), m.name()))
            .collect();
        println!("  {verb}: {}", steps.join(" -> "));
    }

    let requests = [
        Request { verb: "GET", path: "/users", token: Some("token-alice") },
        Request { verb: "POST", path: "/users", token: Some("token-bob") },
        Request { verb: "GET", path: "/users", token: None },
        Request { verb: "PUT", path: "/users/7", token: Some("token-alice") },
    ];

    let journal = Journal::default();
    for request in requests {
        println!("\n{} {}", request.verb, request.path);
        let mut args = TypedArguments::new().value(request.clone()).value(journal.clone());
        let result = handlers.call(request.verb, &mut args);
        for line in journal.drain() {
            println!("  {line}");
        }
        println!("  -> {}", status(&result));
    }

    Ok(())
}
