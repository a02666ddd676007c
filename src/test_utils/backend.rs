//! Stand-ins for the honorarium backend, served by axum on an ephemeral port.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on a free local port and return its base URL, e.g. "http://127.0.0.1:40123".
pub(crate) async fn spawn_fake_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind fake backend");
    let address = listener
        .local_addr()
        .expect("Could not get fake backend address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Fake backend stopped unexpectedly");
    });

    format!("http://{address}")
}

/// A base URL that refuses connections.
pub(crate) async fn unreachable_backend_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind placeholder listener");
    let address = listener
        .local_addr()
        .expect("Could not get placeholder address");
    drop(listener);

    format!("http://{address}")
}
