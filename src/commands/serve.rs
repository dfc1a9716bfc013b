use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::ServeArgs;
use crate::config::WikiConfig;
use crate::render::{PageLookup, Wiki, resolve_page};

async fn index_handler(State(wiki): State<Arc<Wiki>>) -> Response {
    serve_page(wiki, String::new()).await
}

async fn page_handler(State(wiki): State<Arc<Wiki>>, Path(page): Path<String>) -> Response {
    serve_page(wiki, page).await
}

async fn serve_page(wiki: Arc<Wiki>, page: String) -> Response {
    tracing::info!(page = %page, "Page request");

    match tokio::task::spawn_blocking(move || page_response(&wiki, &page)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Render task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
        }
    }
}

/// Resolve and render one page.
fn page_response(wiki: &Wiki, page: &str) -> Response {
    let path = match resolve_page(wiki.wiki_dir(), page) {
        PageLookup::Found(path) => path,
        PageLookup::Forbidden => return (StatusCode::FORBIDDEN, "Invalid path").into_response(),
        PageLookup::NotFound => return (StatusCode::NOT_FOUND, "Page not found").into_response(),
    };

    match wiki.render_page(&path) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
        }
    }
}

fn router(wiki: Arc<Wiki>, config: &WikiConfig) -> Router {
    let mut app = Router::new()
        .route("/wiki/", get(index_handler))
        .route("/wiki/{*page}", get(page_handler))
        .with_state(wiki);

    if config.serve_static {
        app = app.nest_service("/static", ServeDir::new(&config.static_dir));
    }

    app
}

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config = WikiConfig::load_from_arg(args.config_file.as_deref())?;
    let wiki = Arc::new(Wiki::from_config(&config)?);

    let bind = args.bind.as_deref().unwrap_or(&config.server.bind);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;

    let app = router(wiki, &config);

    let display_host = if bind == "0.0.0.0" { "localhost" } else { bind };
    println!("\nServing wiki at http://{display_host}:{port}/wiki/");
    println!("Press Ctrl+C to stop\n");
    tracing::info!(%addr, wiki_dir = %config.wiki_dir.display(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki(root: &std::path::Path) -> Wiki {
        std::fs::create_dir(root.join("wiki")).unwrap();
        std::fs::write(root.join("wiki/index.md"), "Title: Home\n\nWelcome").unwrap();

        let mut config = WikiConfig::default();
        config.resolve_paths(root);
        Wiki::from_config(&config).unwrap()
    }

    #[test]
    fn test_page_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = page_response(&wiki(dir.path()), "");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_page_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = page_response(&wiki(dir.path()), "missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_page_traversal_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let response = page_response(&wiki(dir.path()), "../secret");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
