use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use wire_http::connection::HttpClient;
use wire_http::protocol::{HttpError, Request, HOST};

#[tokio::main]
async fn main() -> Result<(), HttpError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let request = Request::builder()
        .path("/")
        .host("127.0.0.1")
        .port(8080)
        .header(HOST, "127.0.0.1:8080")
        .build();

    let response = HttpClient::send(request).await?;
    info!(status = %response.status(), "received response");
    if let Some(body) = response.body() {
        info!(body = %String::from_utf8_lossy(body), "received body");
    }
    Ok(())
}
