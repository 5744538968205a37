//! `Accept-Language` resolution.

use axum::http::header;

use crate::chain::{Middleware, Next};
use crate::config::LocaleConfig;
use crate::context::{Context, Locale};

/// Stores the request's [`Locale`]: the first `Accept-Language` tag, or the default.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    default_language: String,
}

impl LocaleResolver {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    pub fn from_config(config: &LocaleConfig) -> Self {
        Self::new(config.default_language.clone())
    }

    fn resolve(&self, accept_language: Option<&str>) -> Locale {
        let tag = accept_language
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.split(';').next())
            .map(str::trim)
            .filter(|tag| !tag.is_empty() && *tag != "*");
        Locale(tag.unwrap_or(&self.default_language).to_string())
    }
}

impl Middleware for LocaleResolver {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) {
        let locale = self.resolve(ctx.header(header::ACCEPT_LANGUAGE.as_str()));
        ctx.set(locale);
        next.run(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_wins() {
        let resolver = LocaleResolver::new("en");
        assert_eq!(resolver.resolve(Some("zh-CN,zh;q=0.9,en;q=0.8")).as_str(), "zh-CN");
        assert_eq!(resolver.resolve(Some("fr;q=0.7")).as_str(), "fr");
    }

    #[test]
    fn test_missing_or_empty_header_uses_default() {
        let resolver = LocaleResolver::new("en");
        assert_eq!(resolver.resolve(None).as_str(), "en");
        assert_eq!(resolver.resolve(Some("  ")).as_str(), "en");
        assert_eq!(resolver.resolve(Some("*")).as_str(), "en");
    }

    #[test]
    fn test_locale_visible_downstream() {
        use crate::config::PoolConfig;
        use crate::engine::Engine;
        use axum::body::Bytes;
        use axum::http::{Request, StatusCode};

        let mut app = Engine::builder(PoolConfig::default());
        app.use_middleware(LocaleResolver::new("en"));
        app.get("/hello", |ctx: &mut Context| {
            let lang = ctx.get::<Locale>().map(|l| l.as_str().to_string()).unwrap_or_default();
            ctx.string(StatusCode::OK, lang);
        });
        let engine = app.build();

        let request = Request::builder()
            .uri("/hello")
            .header(header::ACCEPT_LANGUAGE, "de-DE,de;q=0.9")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(engine.serve(request).body().as_ref(), b"de-DE");
    }
}
