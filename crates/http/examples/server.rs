use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use wire_http::connection::HttpConnection;
use wire_http::handler::{make_handler, Mounts, StaticResponse};
use wire_http::protocol::{Response, Status, CONTENT_TYPE};

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let mut mounts = Mounts::new();
    mounts.mount(
        "/",
        StaticResponse::new(
            Response::builder()
                .status(Status::Ok)
                .header(CONTENT_TYPE, "text/plain")
                .body("Hello World!\r\n")
                .build(),
        ),
    );
    mounts.mount(
        "/echo",
        make_handler(|request| {
            let body = request.body().cloned().unwrap_or_default();
            Ok(Response::builder().status(Status::Ok).body(body).build())
        }),
    );
    let handler = Arc::new(mounts);

    loop {
        let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let handler = handler.clone();

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::new(reader, writer);
            if let Err(e) = connection.process(handler).await {
                error!("connection closed with error: {e}");
            }
        });
    }
}
