//! Listener implementation for the daemon's Unix socket.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use fgp_config::SocketEndpoint;

use super::tracker::ConnectionTracker;
use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Interval at which idle connections re-check the drain flag.
pub(crate) const CONNECTION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listener that binds to a socket endpoint.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    listener: UnixListener,
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let listener = bind_unix(endpoint.path().as_std_path())?;
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Starts accepting connections on a background thread.
    ///
    /// The socket file is removed if startup fails and again once the accept
    /// loop exits.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if !handler.is_ready() {
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NotReady {
                path: self.endpoint.path().to_string(),
            });
        }
        if let Err(source) = self.listener.set_nonblocking(true) {
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let tracker = ConnectionTracker::default();
        let endpoint = self.endpoint.clone();
        let accept_loop = AcceptLoop {
            listener: self,
            shutdown: Arc::clone(&shutdown),
            tracker: tracker.clone(),
            handler,
        };
        let handle = thread::Builder::new()
            .name("fgpd-accept".to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| {
                cleanup_unix_socket(&endpoint);
                ListenerError::Spawn { source }
            })?;
        Ok(ListenerHandle {
            shutdown,
            tracker,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    tracker: ConnectionTracker,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stops accepting new clients and asks live handlers to finish.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.tracker.begin_drain();
    }

    /// Waits for the accept loop to exit; the socket file is gone afterwards.
    pub(crate) fn join(&mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }

    /// Waits up to `grace` for live connections to finish.
    pub(crate) fn drain(&self, grace: Duration) -> bool {
        self.tracker.wait_idle(grace)
    }

    /// Closes connections that outlived the grace period.
    pub(crate) fn force_close(&self) -> usize {
        self.tracker.force_close()
    }

    /// Number of connections still being served.
    pub(crate) fn active_connections(&self) -> usize {
        self.tracker.active()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

struct AcceptLoop {
    listener: SocketListener,
    shutdown: Arc<AtomicBool>,
    tracker: ConnectionTracker,
    handler: Arc<dyn ConnectionHandler>,
}

impl AcceptLoop {
    fn run(self) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            "socket listener active"
        );
        let mut last_error = None::<io::ErrorKind>;
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.accept_connection() {
                Ok(Some(stream)) => {
                    last_error = None;
                    self.spawn_handler(stream);
                }
                Ok(None) => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(
                            target: LISTENER_TARGET,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }

        cleanup_unix_socket(&self.listener.endpoint);
        debug!(target: LISTENER_TARGET, "socket listener stopped");
    }

    fn accept_connection(&self) -> Result<Option<UnixStream>, io::Error> {
        match self.listener.listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn spawn_handler(&self, stream: UnixStream) {
        let slot = self.tracker.acquire(stream.try_clone().ok());
        let connection = ConnectionStream::new(stream, self.tracker.drain_signal(), slot);
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name("fgpd-conn".to_owned())
            .spawn(move || handler.handle(connection));
        if let Err(error) = spawned {
            warn!(
                target: LISTENER_TARGET,
                error = %error,
                "failed to spawn connection handler; dropping client"
            );
        }
    }
}

fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata =
            fs::symlink_metadata(path).map_err(|source| ListenerError::UnixMetadata {
                path: path.display().to_string(),
                source,
            })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket {
                path: path.display().to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::UnixInUse {
                    path: path.display().to_string(),
                });
            }
            Err(error)
                if error.kind() == io::ErrorKind::ConnectionRefused
                    || error.kind() == io::ErrorKind::NotFound =>
            {
                debug!(
                    target: LISTENER_TARGET,
                    path = %path.display(),
                    "removing stale unix socket"
                );
                fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            Err(error) => {
                return Err(ListenerError::UnixConnect {
                    path: path.display().to_string(),
                    source: error,
                });
            }
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

fn cleanup_unix_socket(endpoint: &SocketEndpoint) {
    let path = endpoint.path();
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
