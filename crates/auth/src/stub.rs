//! Throwaway HTTP servers standing in for the identity provider in tests.

use axum::Router;

/// Serve `router` on an ephemeral localhost port and return its base URL
/// (no trailing slash).
pub(crate) async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
