//! Mock SMTP server: listener, accept loop, connection threads and the
//! recorded messages

use crate::smtp::config::Configuration;
use crate::smtp::dispatcher::Dispatcher;
use crate::smtp::error::SmtpError;
use crate::smtp::logger::{EventLogger, Logger};
use crate::smtp::message::{Message, MessageHandle, MessageStore};
use crate::smtp::session::SmtpSession;
use crate::smtp::wait_group::{TaskCounter, TaskGuard, WaitGroup};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Mock SMTP server recording every exchange for later assertions
pub struct Server {
    configuration: Arc<Configuration>,
    logger: Arc<dyn Logger>,
    tasks: Arc<dyn TaskCounter>,
    messages: Arc<MessageStore>,
    port_number: u16,
    running: Option<Running>,
}

struct Running {
    shutdown: Arc<AtomicBool>,
    connections: Arc<Connections>,
    local_addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

/// Sockets of live sessions, kept so `stop` can unblock their reads
#[derive(Debug, Default)]
struct Connections {
    next_id: AtomicU64,
    open: Mutex<HashMap<u64, TcpStream>>,
}

impl Connections {
    fn register(&self, stream: &TcpStream) -> Option<u64> {
        let stream = stream.try_clone().ok()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.open.lock().insert(id, stream);
        Some(id)
    }

    fn remove(&self, id: u64) {
        self.open.lock().remove(&id);
    }

    fn shutdown_all(&self) {
        for (_, stream) in self.open.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Everything a connection thread needs
#[derive(Clone)]
struct Context {
    configuration: Arc<Configuration>,
    logger: Arc<dyn Logger>,
    tasks: Arc<dyn TaskCounter>,
    messages: Arc<MessageStore>,
    shutdown: Arc<AtomicBool>,
    connections: Arc<Connections>,
}

impl Context {
    fn accept_loop(self, listener: TcpListener) {
        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => self.spawn_session(stream),
                Err(e) => self
                    .logger
                    .warning(&format!("failed to accept connection: {e}")),
            }
        }
        self.logger.info("accept loop stopped");
    }

    fn spawn_session(&self, stream: TcpStream) {
        let message = self.messages.new_message();
        let id = self.connections.register(&stream);
        self.tasks.add(1);

        let context = self.clone();
        let spawned = thread::Builder::new()
            .name("smtpmock-session".to_string())
            .spawn(move || {
                let _guard = TaskGuard::new(context.tasks.as_ref());
                context.handle_connection(stream, &message);
                if let Some(id) = id {
                    context.connections.remove(id);
                }
            });

        if let Err(e) = spawned {
            self.logger
                .error(&format!("failed to spawn session thread: {e}"));
            if let Some(id) = id {
                self.connections.remove(id);
            }
            self.tasks.done();
        }
    }

    fn handle_connection(&self, stream: TcpStream, message: &MessageHandle) {
        let mut session = match SmtpSession::new(stream, self.logger.clone()) {
            Ok(session) => session,
            Err(e) => {
                self.logger
                    .warning(&format!("failed to set up session: {e}"));
                return;
            }
        };
        self.logger
            .info(&format!("{}: connection accepted", session.peer()));

        Dispatcher::new(&self.configuration, self.logger.as_ref(), &self.shutdown)
            .run(&mut session, message);
    }
}

impl Server {
    /// Create a server logging through `tracing`, gated by the
    /// configuration's logging flags
    pub fn new(configuration: Configuration) -> Self {
        let logger = EventLogger::new(
            configuration.log_to_stdout,
            configuration.log_server_activity,
        );
        Self::with_collaborators(configuration, Arc::new(logger), Arc::new(WaitGroup::new()))
    }

    pub fn with_collaborators(
        configuration: Configuration,
        logger: Arc<dyn Logger>,
        tasks: Arc<dyn TaskCounter>,
    ) -> Self {
        Self {
            port_number: configuration.port_number,
            configuration: Arc::new(configuration),
            logger,
            tasks,
            messages: Arc::new(MessageStore::new()),
            running: None,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Bind the listener and start accepting connections in the background
    pub fn start(&mut self) -> Result<(), SmtpError> {
        if self.running.is_some() {
            return Err(SmtpError::AlreadyStarted);
        }

        let addr = self.configuration.bind_address();
        let listener = TcpListener::bind(&addr).map_err(|source| {
            self.logger
                .error(&format!("failed to start server on {addr}: {source}"));
            SmtpError::Bind {
                addr: addr.clone(),
                source,
            }
        })?;
        let local_addr = listener.local_addr()?;

        let context = Context {
            configuration: self.configuration.clone(),
            logger: self.logger.clone(),
            tasks: self.tasks.clone(),
            messages: self.messages.clone(),
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(Connections::default()),
        };
        let shutdown = context.shutdown.clone();
        let connections = context.connections.clone();

        let accept_loop = thread::Builder::new()
            .name("smtpmock-accept".to_string())
            .spawn(move || context.accept_loop(listener))?;

        self.port_number = local_addr.port();
        self.running = Some(Running {
            shutdown,
            connections,
            local_addr,
            accept_loop,
        });
        self.logger
            .info(&format!("SMTP mock server is listening on {local_addr}"));
        Ok(())
    }

    /// Stop accepting connections, end live sessions and wait for every
    /// connection thread to finish.
    ///
    /// If the accept loop cannot be woken the listener stays bound until the
    /// next incoming connection, and [`SmtpError::Wake`] is returned once the
    /// sessions are drained.
    pub fn stop(&mut self) -> Result<(), SmtpError> {
        let running = self.running.take().ok_or(SmtpError::NotStarted)?;
        running.shutdown.store(true, Ordering::SeqCst);

        // accept() only returns on a new connection, so make one.
        let woken = TcpStream::connect_timeout(&wake_address(running.local_addr), WAKE_TIMEOUT);
        self.finish_stop(running, woken.map(drop))
    }

    fn finish_stop(&self, running: Running, woken: io::Result<()>) -> Result<(), SmtpError> {
        let result = match woken {
            Ok(()) => {
                if running.accept_loop.join().is_err() {
                    self.logger.error("accept loop panicked");
                }
                Ok(())
            }
            Err(source) => {
                let addr = running.local_addr.to_string();
                self.logger
                    .error(&format!("failed to wake accept loop on {addr}: {source}"));
                Err(SmtpError::Wake { addr, source })
            }
        };

        running.connections.shutdown_all();
        self.tasks.wait();
        self.logger.info("SMTP mock server stopped");
        result
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Port the server listens on; assigned by the OS when the configured
    /// port is 0, so only meaningful after [`start`](Self::start)
    pub fn port_number(&self) -> u16 {
        self.port_number
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn message(&self, index: usize) -> Option<Message> {
        self.messages.get(index)
    }

    /// Human readable dump of one message, empty when `index` is out of range
    pub fn message_dump(&self, index: usize) -> String {
        self.message(index)
            .map(|message| message.to_string())
            .unwrap_or_default()
    }

    /// Snapshots of every recorded message in acceptance order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.snapshots()
    }

    pub fn clear_messages(&self) {
        self.messages.clear();
    }

    /// Block until at least `count` fully received messages are recorded
    pub fn wait_for_messages(
        &self,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<Message>, SmtpError> {
        let deadline = Instant::now() + timeout;
        loop {
            let received = self.messages.consistent();
            if received.len() >= count {
                return Ok(received);
            }
            if Instant::now() >= deadline {
                return Err(SmtpError::WaitTimeout {
                    expected: count,
                    received: received.len(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.running.is_some() {
            let _ = self.stop();
        }
    }
}

fn wake_address(local_addr: SocketAddr) -> SocketAddr {
    match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), local_addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), local_addr.port())
        }
        _ => local_addr,
    }
}
