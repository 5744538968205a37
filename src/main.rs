//! Switchyard demo server.
//!
//! ```text
//!     Client Request
//!     ─────▶ http (timeout, request id, trace, body buffer)
//!            ─────▶ engine (trie lookup) ─────▶ chain
//!                   Recovery → Logger → [RateLimiter] → LocaleResolver
//!                   → [group: Authenticate → Authorize] → handler
//!     ◀───── buffered response
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use clap::Parser;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use switchyard::config::{load_config, validate_config, ConfigError, ServerConfig};
use switchyard::context::{Context, Locale};
use switchyard::http::{bind, HttpServer};
use switchyard::lifecycle::{spawn_signal_listener, Shutdown};
use switchyard::middleware::{
    Authenticate, Authorize, LocaleResolver, Logger, RateLimiter, Recovery,
};
use switchyard::observability::{logging, metrics};
use switchyard::Engine;

#[derive(Parser, Debug)]
#[command(name = "switchyard", version, about = "Trie-routed HTTP demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Clone)]
struct Session {
    username: String,
    role: &'static str,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
struct User {
    #[validate(length(min = 1))]
    id: String,
    #[validate(length(min = 3, max = 20))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(range(min = 18, max = 120))]
    age: u32,
}

#[derive(Debug, Deserialize)]
struct Login {
    username: String,
    password: String,
}

type Sessions = Arc<DashMap<String, Session>>;

fn issue_token(sessions: &Sessions, username: &str, role: &'static str) -> String {
    let token = uuid::Uuid::new_v4().to_string();
    sessions.insert(
        token.clone(),
        Session {
            username: username.to_string(),
            role,
        },
    );
    token
}

fn welcome(ctx: &Context) -> &'static str {
    match ctx.get::<Locale>().map(Locale::as_str) {
        Some(lang) if lang.starts_with("zh") => "欢迎",
        Some(lang) if lang.starts_with("fr") => "Bienvenue",
        _ => "Welcome",
    }
}

fn demo_app(config: &ServerConfig) -> Engine {
    let sessions: Sessions = Arc::new(DashMap::new());
    let mut app = Engine::builder(config.pool.clone());

    app.use_middleware(Recovery);
    app.use_middleware(Logger);
    if config.rate_limit.enabled {
        app.use_middleware(RateLimiter::from_config(&config.rate_limit));
    }
    app.use_middleware(LocaleResolver::from_config(&config.locale));

    app.get("/user/:id", |ctx: &mut Context| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        ctx.json(StatusCode::OK, &json!({ "id": id }));
    });

    app.get("/files/*path", |ctx: &mut Context| {
        let path = ctx.param("path").unwrap_or_default().to_string();
        ctx.json(StatusCode::OK, &json!({ "path": path }));
    });

    let register_sessions = sessions.clone();
    app.post("/register", move |ctx: &mut Context| {
        let user: User = match ctx.bind() {
            Ok(user) => user,
            Err(e) => {
                ctx.json(StatusCode::BAD_REQUEST, &json!({ "error": e.to_string() }));
                return;
            }
        };
        if let Err(errors) = user.validate() {
            ctx.json(StatusCode::BAD_REQUEST, &json!({ "error": errors }));
            return;
        }
        let token = issue_token(&register_sessions, &user.username, "user");
        let message = welcome(ctx);
        ctx.json(StatusCode::OK, &json!({ "message": message, "token": token }));
    });

    let login_sessions = sessions.clone();
    app.post("/login", move |ctx: &mut Context| {
        let login: Login = match ctx.bind() {
            Ok(login) => login,
            Err(e) => {
                ctx.json(StatusCode::BAD_REQUEST, &json!({ "error": e.to_string() }));
                return;
            }
        };
        if login.username == "admin" && login.password == "admin123" {
            let token = issue_token(&login_sessions, &login.username, "admin");
            let message = welcome(ctx);
            ctx.json(StatusCode::OK, &json!({ "message": message, "token": token }));
        } else {
            ctx.json(StatusCode::UNAUTHORIZED, &json!({ "error": "Unauthorized" }));
        }
    });

    {
        let verify_sessions = sessions.clone();
        let mut protected = app.group("");
        protected.use_middleware(Authenticate::new(move |token: &str| {
            verify_sessions.get(token).map(|entry| entry.value().clone())
        }));
        protected.use_middleware(Authorize::new(|ctx: &Context| {
            ctx.get::<Session>()
                .is_some_and(|session| matches!(session.role, "admin" | "user"))
        }));
        protected.get("/profile", |ctx: &mut Context| {
            let (username, role) = ctx
                .get::<Session>()
                .map(|s| (s.username.clone(), s.role))
                .unwrap_or_default();
            ctx.json(StatusCode::OK, &json!({ "username": username, "role": role }));
        });
    }

    app.get("/panic", |_ctx: &mut Context| {
        panic!("demo panic");
    });

    app.build()
}

/// File (or defaults) plus CLI overrides, validated as a whole.
fn resolve_config(cli: Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind_address) = cli.bind {
        config.listener.bind_address = bind_address;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Cli::parse())?;

    logging::init_logging(&config.observability)?;
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        pool_max_idle = config.pool.max_idle,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let engine = Arc::new(demo_app(&config));
    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(engine, &config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{header, Method, Request, Response};
    use serde_json::Value;

    fn app() -> Engine {
        demo_app(&ServerConfig::default())
    }

    fn post_json(path: &str, body: Value) -> Request<Bytes> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    fn get(path: &str, token: Option<&str>) -> Request<Bytes> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Bytes::new()).unwrap()
    }

    fn json_body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn login(engine: &Engine) -> String {
        let response = engine.serve(post_json(
            "/login",
            json!({ "username": "admin", "password": "admin123" }),
        ));
        assert_eq!(response.status(), StatusCode::OK);
        json_body(&response)["token"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_register_valid_user_issues_token() {
        let response = app().serve(post_json(
            "/register",
            json!({ "id": "1", "username": "alice", "email": "alice@example.com", "age": 30 }),
        ));
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(&response);
        assert_eq!(body["message"], "Welcome");
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn test_register_rejects_invalid_fields() {
        let engine = app();
        let cases = [
            (json!({ "id": "1", "username": "alice", "email": "@", "age": 30 }), "email"),
            (json!({ "id": "1", "username": "al", "email": "a@b.io", "age": 30 }), "username"),
            (json!({ "id": "1", "username": "alice", "email": "a@b.io", "age": 17 }), "age"),
            (json!({ "id": "", "username": "alice", "email": "a@b.io", "age": 30 }), "id"),
        ];
        for (user, field) in cases {
            let response = engine.serve(post_json("/register", user));
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", field);
            assert!(json_body(&response)["error"].to_string().contains(field));
        }
    }

    #[test]
    fn test_register_unsupported_content_type_is_400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/register")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Bytes::from_static(b"alice"))
            .unwrap();
        assert_eq!(app().serve(request).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_register_welcome_follows_locale() {
        let mut request = post_json(
            "/register",
            json!({ "id": "2", "username": "zhang", "email": "z@example.cn", "age": 40 }),
        );
        request
            .headers_mut()
            .insert(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9".parse().unwrap());
        let response = app().serve(request);
        assert_eq!(json_body(&response)["message"], "欢迎");
    }

    #[test]
    fn test_login_wrong_password_is_401() {
        let response = app().serve(post_json(
            "/login",
            json!({ "username": "admin", "password": "guess" }),
        ));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_profile_requires_issued_token() {
        let engine = app();
        assert_eq!(
            engine.serve(get("/profile", None)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            engine.serve(get("/profile", Some("made-up"))).status(),
            StatusCode::UNAUTHORIZED
        );

        let token = login(&engine);
        let response = engine.serve(get("/profile", Some(&token)));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(&response),
            json!({ "username": "admin", "role": "admin" })
        );
    }

    #[test]
    fn test_sample_param_and_wildcard_routes() {
        let engine = app();
        let response = engine.serve(get("/user/42", None));
        assert_eq!(json_body(&response), json!({ "id": "42" }));
        let response = engine.serve(get("/files/docs/readme.md", None));
        assert_eq!(json_body(&response), json!({ "path": "docs/readme.md" }));
    }

    #[test]
    fn test_panic_route_is_recovered() {
        let response = app().serve(get("/panic", None));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(&response),
            json!({ "error": "Internal server error" })
        );
    }

    #[test]
    fn test_bind_override_is_validated() {
        let cli = Cli::parse_from(["switchyard", "--bind", "not-an-address"]);
        match resolve_config(cli) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }

        let cli = Cli::parse_from(["switchyard", "--bind", "127.0.0.1:3000"]);
        let config = resolve_config(cli).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
    }
}
