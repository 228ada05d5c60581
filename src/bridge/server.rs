//! Launcher socket server
//!
//! Launchers connect over a Unix socket and speak the line protocol in
//! [`protocol`](super::protocol). Each connection gets a reader thread
//! that posts calls to the control thread and a writer thread that
//! drains a bounded notification queue, so a slow launcher never blocks
//! the control thread; when the queue is full notifications are dropped.
//! Query calls are answered on the connection directly.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use super::control::BridgeHandle;
use super::protocol::{OverlayNotification, OverlayRequest};
use super::{BridgeCall, OverlayCallback};
use crate::error::BridgeError;

/// Notifications queued per connection before new ones are dropped
const NOTIFICATION_QUEUE_LEN: usize = 256;

pub struct FeedServer {
    listener: UnixListener,
    path: PathBuf,
    handle: BridgeHandle,
}

impl FeedServer {
    /// Bind the socket, replacing a stale one left by a previous run.
    /// A socket something still listens on is left alone.
    pub fn bind(path: &Path, handle: BridgeHandle) -> Result<Self, BridgeError> {
        if path.exists() {
            if UnixStream::connect(path).is_ok() {
                return Err(BridgeError::SocketInUse(path.to_path_buf()));
            }
            debug!(path = %path.display(), "Removing stale socket");
            std::fs::remove_file(path)?;
        }
        let listener = UnixListener::bind(path)?;
        info!(path = %path.display(), "Feed socket listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            handle,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections on a background thread
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("feed-server".into())
            .spawn(move || self.accept_loop())
    }

    fn accept_loop(self) {
        let mut next_client: u64 = 1;
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    continue;
                }
            };
            let client = next_client;
            next_client = next_client.wrapping_add(1).max(1);
            info!(client, "Launcher connected");

            let handle = self.handle.clone();
            let spawned = thread::Builder::new()
                .name(format!("feed-client-{}", client))
                .spawn(move || {
                    if let Err(e) = serve_connection(stream, client, &handle) {
                        warn!(client, error = %e, "Launcher connection ended with error");
                    }
                });
            if let Err(e) = spawned {
                error!(client, error = %e, "Failed to start connection thread");
            }
        }
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Notification sink for one connection; never blocks
struct SocketCallback {
    client: u64,
    lines: mpsc::SyncSender<String>,
}

impl SocketCallback {
    fn notify(&self, notification: OverlayNotification) {
        if !send(&self.lines, &notification) {
            debug!(client = self.client, "Launcher gone or not reading, notification dropped");
        }
    }
}

impl OverlayCallback for SocketCallback {
    fn overlay_status_changed(&mut self, status: i32) {
        self.notify(OverlayNotification::OverlayStatusChanged { status });
    }

    fn overlay_scroll_changed(&mut self, progress: f32) {
        self.notify(OverlayNotification::OverlayScrollChanged { progress });
    }
}

/// Queue a notification without waiting; false if it was dropped
fn send(lines: &mpsc::SyncSender<String>, notification: &OverlayNotification) -> bool {
    match notification.to_line() {
        Ok(line) => lines.try_send(line).is_ok(),
        Err(e) => {
            error!(error = %e, "Failed to encode notification");
            false
        }
    }
}

/// Serve one launcher connection until it closes. The control thread
/// is told when the client goes away.
pub fn serve_connection(stream: UnixStream, client: u64, handle: &BridgeHandle) -> Result<(), BridgeError> {
    let mut writer = stream.try_clone()?;
    let (lines, outgoing) = mpsc::sync_channel::<String>(NOTIFICATION_QUEUE_LEN);
    thread::spawn(move || {
        while let Ok(line) = outgoing.recv() {
            if writer.write_all(line.as_bytes()).and_then(|_| writer.flush()).is_err() {
                break;
            }
        }
    });

    let result = read_requests(BufReader::new(stream), client, handle, &lines);
    info!(client, "Launcher disconnected");
    handle.call(client, BridgeCall::ClientGone)?;
    result
}

fn read_requests(
    reader: impl BufRead,
    client: u64,
    handle: &BridgeHandle,
    lines: &mpsc::SyncSender<String>,
) -> Result<(), BridgeError> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<OverlayRequest>(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(client, error = %e, "Malformed request");
                send(lines, &OverlayNotification::Error { message: e.to_string() });
                continue;
            }
        };

        if let Some(value) = request.stub_reply() {
            send(lines, &OverlayNotification::Reply { value });
            continue;
        }

        if let Some(call) = into_call(request, client, lines) {
            handle.call(client, call)?;
        }
    }
    Ok(())
}

fn into_call(request: OverlayRequest, client: u64, lines: &mpsc::SyncSender<String>) -> Option<BridgeCall> {
    let call = match request {
        OverlayRequest::WindowAttached { layout, flags } => BridgeCall::WindowAttached {
            layout,
            flags,
            callback: Box::new(SocketCallback {
                client,
                lines: lines.clone(),
            }),
        },
        OverlayRequest::WindowDetached { is_changing_configurations } => {
            BridgeCall::WindowDetached { is_changing_configurations }
        }
        OverlayRequest::StartScroll => BridgeCall::StartScroll,
        OverlayRequest::OnScroll { progress } => BridgeCall::OnScroll { progress },
        OverlayRequest::EndScroll => BridgeCall::EndScroll,
        OverlayRequest::CloseOverlay { flags } => BridgeCall::CloseOverlay { flags },
        OverlayRequest::OpenOverlay { flags } => BridgeCall::OpenOverlay { flags },
        OverlayRequest::OnPause => BridgeCall::OnPause,
        OverlayRequest::OnResume => BridgeCall::OnResume,
        OverlayRequest::SetActivityState { flags } => BridgeCall::SetActivityState { flags },
        OverlayRequest::RequestVoiceDetection { start } => BridgeCall::RequestVoiceDetection { start },
        OverlayRequest::UnusedMethod => {
            debug!(client, "unusedMethod");
            return None;
        }
        OverlayRequest::HasOverlayContent
        | OverlayRequest::IsVoiceDetectionRunning
        | OverlayRequest::GetVoiceSearchLanguage
        | OverlayRequest::StartSearch { .. } => return None,
    };
    Some(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::Value;

    use crate::bridge::{ControlLoop, HeadlessHost, LauncherFeed};
    use crate::config::RebindPolicy;
    use crate::feed::FeedController;
    use crate::input::SwipeDetector;

    fn control_loop() -> (ControlLoop, BridgeHandle) {
        let controller = FeedController::new(SwipeDetector::default(), 1080.0);
        let feed = LauncherFeed::new(controller, Box::new(HeadlessHost::new()), RebindPolicy::Detach);
        ControlLoop::new(feed, Duration::from_millis(5)).unwrap()
    }

    type Served = JoinHandle<Result<(), BridgeError>>;

    /// Launcher end of a socket pair, served by a connection thread
    fn connect(handle: &BridgeHandle, client: u64) -> (UnixStream, BufReader<UnixStream>, Served) {
        let (launcher, service) = UnixStream::pair().unwrap();
        let handle = handle.clone();
        let served = thread::spawn(move || serve_connection(service, client, &handle));
        launcher.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let reader = BufReader::new(launcher.try_clone().unwrap());
        (launcher, reader, served)
    }

    fn write_line(stream: &mut UnixStream, line: &str) {
        stream.write_all(line.as_bytes()).unwrap();
        stream.write_all(b"\n").unwrap();
    }

    fn read_message(reader: &mut BufReader<UnixStream>) -> Value {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        serde_json::from_str(&line).unwrap()
    }

    fn pump_until(control: &mut ControlLoop, done: impl Fn(&ControlLoop) -> bool) {
        for _ in 0..200 {
            if done(control) {
                return;
            }
            control.dispatch_pending(Some(Duration::from_millis(10))).unwrap();
        }
        panic!("control loop never reached the expected state");
    }

    #[test]
    fn test_queries_answered_without_control_loop() {
        let (_control, handle) = control_loop();
        let (mut launcher, mut reader, _served) = connect(&handle, 1);

        write_line(&mut launcher, r#"{"type":"has_overlay_content"}"#);
        write_line(&mut launcher, r#"{"type":"get_voice_search_language"}"#);

        let reply = read_message(&mut reader);
        assert_eq!(reply["type"], "reply");
        assert_eq!(reply["value"], true);
        let reply = read_message(&mut reader);
        assert_eq!(reply["value"], "en");
    }

    #[test]
    fn test_malformed_line_gets_error() {
        let (_control, handle) = control_loop();
        let (mut launcher, mut reader, _served) = connect(&handle, 1);

        write_line(&mut launcher, "not json");
        let message = read_message(&mut reader);
        assert_eq!(message["type"], "error");
        assert!(message["message"].as_str().is_some());

        // The connection survives
        write_line(&mut launcher, r#"{"type":"is_voice_detection_running"}"#);
        assert_eq!(read_message(&mut reader)["value"], false);
    }

    #[test]
    fn test_bind_and_scroll_over_socket() {
        let (mut control, handle) = control_loop();
        let (mut launcher, mut reader, _served) = connect(&handle, 4);

        write_line(&mut launcher, r#"{"type":"window_attached","layout":{"width":1000}}"#);
        pump_until(&mut control, |c| c.feed().is_bound());
        let status = read_message(&mut reader);
        assert_eq!(status["type"], "overlay_status_changed");
        assert_eq!(status["status"], 1);

        write_line(&mut launcher, r#"{"type":"start_scroll"}"#);
        write_line(&mut launcher, r#"{"type":"on_scroll","progress":0.25}"#);
        pump_until(&mut control, |c| c.feed().controller().progress() > 0.0);

        let scroll = read_message(&mut reader);
        assert_eq!(scroll["type"], "overlay_scroll_changed");
        let progress = scroll["progress"].as_f64().unwrap();
        assert!((progress - 0.25).abs() < 0.001);
        assert!(control.feed().is_attached());
    }

    #[test]
    fn test_disconnect_unbinds_client() {
        let (mut control, handle) = control_loop();
        let (mut launcher, mut reader, _served) = connect(&handle, 9);

        write_line(&mut launcher, r#"{"type":"window_attached"}"#);
        pump_until(&mut control, |c| c.feed().bound_client() == Some(9));
        read_message(&mut reader);

        launcher.shutdown(std::net::Shutdown::Both).unwrap();
        drop(launcher);
        pump_until(&mut control, |c| !c.feed().is_bound());
        assert!(!control.feed().is_attached());
    }

    #[test]
    fn test_other_connection_cannot_drive_binding() {
        let (mut control, handle) = control_loop();
        let (mut owner, mut owner_reader, _owner_served) = connect(&handle, 1);
        let (mut intruder, _intruder_reader, intruder_served) = connect(&handle, 2);

        write_line(&mut owner, r#"{"type":"window_attached"}"#);
        write_line(&mut owner, r#"{"type":"start_scroll"}"#);
        write_line(&mut owner, r#"{"type":"on_scroll","progress":0.4}"#);
        pump_until(&mut control, |c| c.feed().controller().progress() > 0.0);
        assert_eq!(read_message(&mut owner_reader)["type"], "overlay_status_changed");
        read_message(&mut owner_reader);

        write_line(&mut intruder, r#"{"type":"on_scroll","progress":0.9}"#);
        write_line(&mut intruder, r#"{"type":"close_overlay","flags":0}"#);
        write_line(&mut intruder, r#"{"type":"window_detached"}"#);
        intruder.shutdown(std::net::Shutdown::Both).unwrap();
        // Everything the second connection sent is queued once its thread ends
        intruder_served.join().unwrap().unwrap();
        control.dispatch_pending(Some(Duration::from_millis(10))).unwrap();
        control.dispatch_pending(Some(Duration::ZERO)).unwrap();

        assert_eq!(control.feed().bound_client(), Some(1));
        assert!(control.feed().is_attached());
        assert!((control.feed().controller().progress() - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_send_drops_when_queue_is_full() {
        let (lines, outgoing) = mpsc::sync_channel::<String>(1);
        let notification = OverlayNotification::OverlayScrollChanged { progress: 0.5 };

        assert!(send(&lines, &notification));
        assert!(!send(&lines, &notification));
        assert_eq!(outgoing.try_iter().count(), 1);

        drop(outgoing);
        assert!(!send(&lines, &notification));
    }

    #[test]
    fn test_bind_refuses_live_socket() {
        let (_control, handle) = control_loop();
        let path = std::env::temp_dir().join(format!("flick-feed-live-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let first = FeedServer::bind(&path, handle.clone()).unwrap();
        assert!(matches!(FeedServer::bind(&path, handle), Err(BridgeError::SocketInUse(_))));
        assert!(UnixStream::connect(&path).is_ok());
        drop(first);
    }

    #[test]
    fn test_bind_replaces_stale_socket() {
        let (_control, handle) = control_loop();
        let path = std::env::temp_dir().join(format!("flick-feed-test-{}.sock", std::process::id()));
        std::fs::write(&path, b"stale").unwrap();

        let server = FeedServer::bind(&path, handle).unwrap();
        assert_eq!(server.path(), path.as_path());
        assert!(UnixStream::connect(&path).is_ok());

        drop(server);
        assert!(!path.exists());
    }
}
