//! Payment redirect collaborator.
//!
//! The purchase action hands a fixed checkout URL to a [`CheckoutLauncher`]
//! and moves on. Nothing comes back: no return value, no callback, no retry.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};

use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Opens a checkout URL in a new browsing context.
pub trait CheckoutLauncher: Send + Sync {
    fn open(&self, url: &str);
}

/// Logs the redirect. Used by the HTTP server, where the web client opens
/// the URL it gets back.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCheckout;

impl CheckoutLauncher for LogCheckout {
    fn open(&self, url: &str) {
        info!(url, "Checkout redirect issued");
    }
}

/// Launches the platform browser. Used by the terminal session.
///
/// The opener runs detached; a background task waits on it so no zombie is
/// left behind.
#[derive(Debug, Clone)]
pub struct BrowserCheckout {
    program: String,
    args: Vec<String>,
}

impl Default for BrowserCheckout {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };
        Self::with_opener(program, args)
    }
}

impl BrowserCheckout {
    /// Use `program args.. url` to open checkout URLs.
    pub fn with_opener(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Spawn the opener and a task that reaps it. `None` if nothing was
    /// spawned.
    fn launch(&self, url: &str) -> Option<JoinHandle<Option<ExitStatus>>> {
        if Handle::try_current().is_err() {
            warn!(url, "No async runtime; cannot launch browser for checkout");
            return None;
        }

        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(url, program = %self.program, error = %e, "Could not launch browser for checkout");
                return None;
            }
        };
        info!(url, program = %self.program, "Opened checkout in browser");

        let program = self.program.clone();
        Some(tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    debug!(%program, %status, "Browser opener exited");
                    Some(status)
                }
                Err(e) => {
                    warn!(%program, error = %e, "Failed waiting on browser opener");
                    None
                }
            }
        }))
    }
}

impl CheckoutLauncher for BrowserCheckout {
    fn open(&self, url: &str) {
        let _ = self.launch(url);
    }
}

/// Records every URL it is asked to open.
#[derive(Debug, Default)]
pub struct MemoryCheckout {
    opened: Mutex<Vec<String>>,
}

impl MemoryCheckout {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl CheckoutLauncher for MemoryCheckout {
    fn open(&self, url: &str) {
        if let Ok(mut urls) = self.opened.lock() {
            urls.push(url.to_string());
        }
    }
}
