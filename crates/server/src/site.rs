//! Marketing site routes: the landing page with the embedded chat widget,
//! the legal pages, and the static widget assets. Presentation only; the
//! chat logic lives behind `/api/v1/chat`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tera::{Context, Tera};
use tower_http::services::ServeDir;
use tracing::{error, warn};

#[derive(Clone)]
pub struct SiteState {
    templates: Arc<Tera>,
    app_store_url: String,
}

/// Load site templates from the filesystem, falling back to the embedded
/// copies so the binary renders without a templates directory next to it.
fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/site/**/*") {
        Ok(tera) => tera,
        Err(error) => {
            warn!(
                error = %error,
                "failed to load site templates from filesystem, using empty Tera instance"
            );
            Tera::default()
        }
    };

    tera.add_raw_template("index.html", include_str!("../../../templates/site/index.html")).ok();
    tera.add_raw_template(
        "privacy-policy.html",
        include_str!("../../../templates/site/privacy-policy.html"),
    )
    .ok();
    tera.add_raw_template(
        "terms-conditions.html",
        include_str!("../../../templates/site/terms-conditions.html"),
    )
    .ok();

    Arc::new(tera)
}

pub fn router(app_store_url: String) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/privacy-policy", get(privacy_page))
        .route("/terms-conditions", get(terms_page))
        .nest_service("/assets", ServeDir::new("assets"))
        .with_state(SiteState { templates: init_templates(), app_store_url })
}

async fn landing_page(State(state): State<SiteState>) -> impl IntoResponse {
    render(&state, "index.html")
}

async fn privacy_page(State(state): State<SiteState>) -> impl IntoResponse {
    render(&state, "privacy-policy.html")
}

async fn terms_page(State(state): State<SiteState>) -> impl IntoResponse {
    render(&state, "terms-conditions.html")
}

fn render(state: &SiteState, template: &str) -> (StatusCode, Html<String>) {
    let mut context = Context::new();
    context.insert("app_store_url", &state.app_store_url);

    match state.templates.render(template, &context) {
        Ok(body) => (StatusCode::OK, Html(body)),
        Err(render_error) => {
            error!(
                template,
                error = %render_error,
                "site template failed to render"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>TailorLink</h1><p>This page is temporarily unavailable.</p>".to_string()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::router;

    async fn page(uri: &str) -> (StatusCode, String) {
        let response = router("https://store.example/app".to_string())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn landing_page_renders_with_the_store_link() {
        let (status, body) = page("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("TailorLink"));
        assert!(body.contains("https://store.example/app"));
        assert!(body.contains("chat-widget.js"));
    }

    #[tokio::test]
    async fn legal_pages_render() {
        let (status, body) = page("/privacy-policy").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Privacy Policy"));

        let (status, body) = page("/terms-conditions").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Terms"));
    }
}
