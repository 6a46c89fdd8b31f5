//! hyper server glue and JSON response helpers

use std::sync::Arc;

use crate::control::Bridge;

pub type HttpResult = Result<HttpResponse, std::io::Error>;

pub type HttpResponse =
    hyper::Response<http_body_util::combinators::BoxBody<hyper::body::Bytes, std::io::Error>>;

/// Accept loop: one spawned task per connection, forever.
pub async fn run_server<T: hearth_ble::GattTransport + 'static>(
    listener: tokio::net::TcpListener,
    bridge: Arc<Bridge<T>>,
) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                tokio::task::spawn(handle_connection(stream, bridge.clone()));
            }
            Err(e) => {
                tracing::warn!("failed to accept: {e:?}");
                continue;
            }
        }
    }
}

async fn handle_connection<T: hearth_ble::GattTransport + 'static>(
    stream: tokio::net::TcpStream,
    bridge: Arc<Bridge<T>>,
) {
    let io = hyper_util::rt::TokioIo::new(stream);

    // http1.1 that upgrades to http2 if the client asks for it.
    let builder =
        hyper_util::server::conn::auto::Builder::new(hyper_util::rt::tokio::TokioExecutor::new());
    let conn = builder.serve_connection(
        io,
        hyper::service::service_fn(move |r: hyper::Request<hyper::body::Incoming>| {
            let bridge = bridge.clone();
            async move { bridge.handle(r.method(), r.uri().path()).await }
        }),
    );

    if let Err(e) = conn.await {
        tracing::warn!("connection error: {e:?}");
    }
}

pub fn json<S: serde::Serialize>(o: S) -> HttpResult {
    json_with_status(o, hyper::StatusCode::OK)
}

pub fn json_with_status<S: serde::Serialize>(o: S, status: hyper::StatusCode) -> HttpResult {
    let bytes = match serde_json::to_vec(&o) {
        Ok(v) => v,
        Err(e) => {
            return bytes_to_resp(
                format!("failed to serialize json: {e:?}").into_bytes(),
                hyper::StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };
    bytes_to_resp(bytes, status)
}

/// `{"error": message}` with the given status.
pub fn json_error<M: AsRef<str>>(status: hyper::StatusCode, message: M) -> HttpResult {
    json_with_status(serde_json::json!({ "error": message.as_ref() }), status)
}

/// 503 with a `Retry-After` hint, for requests that arrive while the link
/// supervisor is still reconnecting.
pub fn service_unavailable<M: AsRef<str>>(
    message: M,
    retry_after: std::time::Duration,
) -> HttpResult {
    let mut r = json_error(hyper::StatusCode::SERVICE_UNAVAILABLE, message)?;
    if let Ok(value) = retry_after.as_secs().to_string().parse() {
        r.headers_mut().insert(hyper::header::RETRY_AFTER, value);
    }
    Ok(r)
}

pub fn bytes_to_resp(bytes: Vec<u8>, status: hyper::StatusCode) -> HttpResult {
    use http_body_util::BodyExt;

    let mut r = hyper::Response::new(
        http_body_util::Full::new(hyper::body::Bytes::from(bytes))
            .map_err(|e| match e {})
            .boxed(),
    );
    *r.status_mut() = status;
    r.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(r)
}
