//! Route dispatch: one HTTP action, one GATT write
//!
//! Request walkthrough:
//! 1. parse the path into an action and optional level
//! 2. gate on link readiness (503 while the supervisor reconnects)
//! 3. lock the device state for the whole dispatch
//! 4. encode, send, and only then commit the state change

use std::time::Duration;

use hearth_ble::{GattTransport, Link, TransportError};
use hearth_proto::{Level, POWER_OFF, POWER_ON, parse_raw};
use serde_json::json;

use crate::http::{self, HttpResult};
use crate::state::DeviceState;

/// The bridge core handed to every request handler. No globals: tests
/// build one of these around a fake transport.
pub struct Bridge<T: GattTransport> {
    link: Link<T>,
    state: tokio::sync::Mutex<DeviceState>,
    retry_hint: Duration,
}

impl<T: GattTransport> Bridge<T> {
    pub fn new(link: Link<T>, retry_hint: Duration) -> Self {
        Self {
            link,
            state: tokio::sync::Mutex::new(DeviceState::default()),
            retry_hint,
        }
    }

    pub async fn device_state(&self) -> DeviceState {
        *self.state.lock().await
    }

    pub async fn handle(&self, method: &hyper::Method, path: &str) -> HttpResult {
        if method != hyper::Method::GET {
            return http::json_error(
                hyper::StatusCode::METHOD_NOT_ALLOWED,
                format!("method {method} not allowed"),
            );
        }

        match path {
            // Liveness only. Must answer 200 even while BLE is down.
            "/" => http::json(json!({ "status": "Running" })),
            "/state" => self.report_state().await,
            _ => match path.strip_prefix("/control/") {
                Some(rest) => {
                    let (action, n) = match rest.split_once('/') {
                        Some((action, n)) => (action, Some(n)),
                        None => (rest, None),
                    };
                    self.control(action, n).await
                }
                None => {
                    http::json_error(hyper::StatusCode::NOT_FOUND, format!("not found: {path}"))
                }
            },
        }
    }

    async fn report_state(&self) -> HttpResult {
        let state = self.device_state().await;
        http::json(json!({
            "is_on": state.is_on,
            "flame_height": state.flame_height.get(),
            "flame_speed": state.flame_speed.get(),
            "link": self.link.state().await.to_string(),
        }))
    }

    async fn control(&self, action: &str, n: Option<&str>) -> HttpResult {
        // Extra path segments must be integers even for actions that
        // ignore them.
        let n: Option<i64> = match n {
            Some(raw) => match raw.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    return http::json_error(
                        hyper::StatusCode::BAD_REQUEST,
                        format!("invalid value: {raw}"),
                    );
                }
            },
            None => None,
        };

        // Readiness gate only; connecting stays in the supervisor task.
        if self.link.ensure_ready().await.is_err() {
            return http::service_unavailable("link is not connected", self.retry_hint);
        }

        tracing::info!(action, value = ?n, "control request");

        let mut state = self.state.lock().await;
        match action {
            "on" => match self.link.send(&POWER_ON).await {
                Ok(()) => {
                    state.is_on = true;
                    http::json(json!({ "status": "Turned ON" }))
                }
                Err(e) => send_failed(e),
            },
            "off" => match self.link.send(&POWER_OFF).await {
                Ok(()) => {
                    state.is_on = false;
                    http::json(json!({ "status": "Turned OFF" }))
                }
                Err(e) => send_failed(e),
            },
            "flame_height" | "flame_speed" => {
                let Some(n) = n else {
                    return http::json_error(
                        hyper::StatusCode::BAD_REQUEST,
                        format!("{action} requires a value"),
                    );
                };
                let level = match u8::try_from(n).map_err(|_| ()).and_then(|v| {
                    Level::new(v).map_err(|_| ())
                }) {
                    Ok(level) => level,
                    Err(()) => {
                        return http::json_error(
                            hyper::StatusCode::BAD_REQUEST,
                            format!("level {n} out of range, expected 1-7"),
                        );
                    }
                };

                // The device's single flame opcode carries both values, so
                // either action re-transmits the pair.
                let mut next = *state;
                if action == "flame_height" {
                    next.flame_height = level;
                } else {
                    next.flame_speed = level;
                }
                match self.link.send(&next.flame_frame()).await {
                    Ok(()) => {
                        *state = next;
                        http::json(json!({ "status": format!("Ran {action}") }))
                    }
                    Err(e) => send_failed(e),
                }
            }
            // Escape hatch: any other action is a raw hex frame for
            // undocumented opcodes. No state change.
            raw => match parse_raw(raw) {
                Ok(bytes) => match self.link.send(&bytes).await {
                    Ok(()) => http::json(json!({ "status": format!("Ran {raw}") })),
                    Err(e) => send_failed(e),
                },
                Err(e) => http::json_error(hyper::StatusCode::BAD_REQUEST, e.to_string()),
            },
        }
    }
}

fn send_failed(e: TransportError) -> HttpResult {
    tracing::error!("command write failed: {e}");
    http::json_error(
        hyper::StatusCode::BAD_GATEWAY,
        format!("Failed to send command: {e}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use hearth_ble::{FakeTransport, LinkConfig};
    use hyper::{Method, StatusCode};

    async fn connected_bridge() -> (Bridge<FakeTransport>, FakeTransport) {
        let transport = FakeTransport::new();
        let config = LinkConfig::default().with_retry_backoff(Duration::from_millis(1));
        let link = Link::new(transport.clone(), config);
        link.connect().await;
        (Bridge::new(link, Duration::from_secs(5)), transport)
    }

    fn idle_bridge() -> Bridge<FakeTransport> {
        let link = Link::new(FakeTransport::new(), LinkConfig::default());
        Bridge::new(link, Duration::from_secs(5))
    }

    async fn get(bridge: &Bridge<FakeTransport>, path: &str) -> HttpResponse {
        bridge.handle(&Method::GET, path).await.unwrap()
    }

    async fn body(resp: HttpResponse) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_is_alive_without_ble() {
        let bridge = idle_bridge();
        let resp = get(&bridge, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, json!({ "status": "Running" }));
    }

    #[tokio::test]
    async fn power_on_commits_state_after_write() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/on").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, json!({ "status": "Turned ON" }));
        assert!(bridge.device_state().await.is_on);
        assert_eq!(transport.writes(), vec![POWER_ON.to_vec()]);
    }

    #[tokio::test]
    async fn duplicate_power_on_is_not_suppressed() {
        let (bridge, transport) = connected_bridge().await;
        get(&bridge, "/control/on").await;
        get(&bridge, "/control/on").await;
        assert!(bridge.device_state().await.is_on);
        assert_eq!(transport.writes().len(), 2);
    }

    #[tokio::test]
    async fn failed_off_leaves_state_untouched() {
        let (bridge, transport) = connected_bridge().await;
        get(&bridge, "/control/on").await;

        transport.fail_writes(1);
        let resp = get(&bridge, "/control/off").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let error = body(resp).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Failed to send command:"));
        assert!(bridge.device_state().await.is_on);
    }

    #[tokio::test]
    async fn flame_height_sends_combined_frame() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/flame_height/5").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, json!({ "status": "Ran flame_height" }));

        let state = bridge.device_state().await;
        assert_eq!(state.flame_height.get(), 5);
        assert_eq!(state.flame_speed.get(), 7);

        let writes = transport.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][3], 5);
        assert_eq!(writes[0][4], 7);
    }

    #[tokio::test]
    async fn flame_speed_keeps_tracked_height() {
        let (bridge, transport) = connected_bridge().await;
        get(&bridge, "/control/flame_height/2").await;
        get(&bridge, "/control/flame_speed/4").await;

        let writes = transport.writes();
        assert_eq!(writes[1][3], 2);
        assert_eq!(writes[1][4], 4);
    }

    #[tokio::test]
    async fn out_of_range_level_is_rejected_without_write() {
        let (bridge, transport) = connected_bridge().await;
        for path in ["/control/flame_speed/9", "/control/flame_height/0"] {
            let resp = get(&bridge, path).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert!(transport.writes().is_empty());
        assert_eq!(bridge.device_state().await, DeviceState::default());
    }

    #[tokio::test]
    async fn flame_action_requires_a_value() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/flame_height").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(transport.writes().is_empty());
    }

    #[tokio::test]
    async fn non_integer_value_is_rejected() {
        let (bridge, _) = connected_bridge().await;
        let resp = get(&bridge, "/control/flame_height/abc").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_action_is_raw_hex() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/deadbeef").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, json!({ "status": "Ran deadbeef" }));
        assert_eq!(transport.writes(), vec![vec![0xde, 0xad, 0xbe, 0xef]]);
        // Raw commands never touch tracked state.
        assert_eq!(bridge.device_state().await, DeviceState::default());
    }

    #[tokio::test]
    async fn garbage_action_is_rejected() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/banana").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(transport.writes().is_empty());
    }

    #[tokio::test]
    async fn control_reports_503_while_disconnected() {
        let bridge = idle_bridge();
        let resp = get(&bridge, "/control/on").await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            resp.headers().get(hyper::header::RETRY_AFTER).unwrap(),
            "5"
        );
    }

    #[tokio::test]
    async fn severed_link_turns_into_503() {
        let (bridge, transport) = connected_bridge().await;
        transport.sever();
        let resp = get(&bridge, "/control/on").await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn state_endpoint_reports_tracked_state() {
        let (bridge, _) = connected_bridge().await;
        get(&bridge, "/control/on").await;
        get(&bridge, "/control/flame_height/3").await;

        let resp = get(&bridge, "/state").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body(resp).await,
            json!({
                "is_on": true,
                "flame_height": 3,
                "flame_speed": 7,
                "link": "connected",
            })
        );
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let bridge = idle_bridge();
        let resp = get(&bridge, "/nope").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_is_405() {
        let bridge = idle_bridge();
        let resp = bridge.handle(&Method::POST, "/control/on").await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn extra_value_on_power_action_is_ignored() {
        let (bridge, transport) = connected_bridge().await;
        let resp = get(&bridge, "/control/on/3").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(transport.writes(), vec![POWER_ON.to_vec()]);
    }
}
