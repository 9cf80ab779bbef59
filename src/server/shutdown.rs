//! Process signal handling
//!
//! The first signal starts a graceful shutdown; a second one forces exit.

use futures::stream::{self, BoxStream, StreamExt};
use std::io;

/// Listener for the signals that stop the server
///
/// On Unix these are SIGINT, SIGHUP and SIGQUIT; elsewhere Ctrl-C.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Installs the signal handlers
    pub fn new() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                hangup: signal(SignalKind::hangup())?,
                quit: signal(SignalKind::quit())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Waits for the next signal and returns its name
    pub async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.hangup.recv() => "SIGHUP",
                _ = self.quit.recv() => "SIGQUIT",
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            "Ctrl-C"
        }
    }

    /// Turns the listener into an endless stream of signal names
    pub fn into_stream(self) -> BoxStream<'static, &'static str> {
        stream::unfold(self, |mut signals| async move {
            let name = signals.recv().await;
            Some((name, signals))
        })
        .boxed()
    }
}
