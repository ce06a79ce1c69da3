use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::FetchError;

pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;

/// Produces rendered HTML for a URL, executing any client-side JavaScript
/// first. No headless-browser crate is used; the default implementation
/// shells out to a real browser binary and captures its rendered DOM dump.
pub trait Renderer: Send + Sync {
    fn render<'a>(&'a self, url: &'a str, timeout_duration: Duration) -> RenderFuture<'a>;
}

/// Shells out to a headless Chromium/Chrome binary per render. The child
/// process is always killed if it has not exited by `timeout_duration`, so
/// a hung render never leaks a process — the "guaranteed release" the
/// rendered fetch path must provide.
#[derive(Debug, Clone)]
pub struct ChromiumProcessRenderer {
    binary_path: String,
}

impl ChromiumProcessRenderer {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    async fn render_inner(&self, url: &str, timeout_duration: Duration) -> Result<String, FetchError> {
        let child = Command::new(&self.binary_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--dump-dom")
            .arg("--virtual-time-budget=5000")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| FetchError::RenderFailed(format!("failed to spawn renderer: {err}")))?;

        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(FetchError::RenderFailed(format!(
                    "renderer process error: {err}"
                )))
            }
            Err(_) => {
                return Err(FetchError::RenderFailed(format!(
                    "render timed out after {timeout_duration:?}"
                )));
            }
        };

        if !output.status.success() {
            return Err(FetchError::RenderFailed(format!(
                "renderer exited with status {}",
                output.status
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|err| FetchError::RenderFailed(format!("renderer output not utf8: {err}")))
    }
}

impl Default for ChromiumProcessRenderer {
    fn default() -> Self {
        Self::new(std::env::var("CHROMIUM_PATH").unwrap_or_else(|_| "chromium".to_string()))
    }
}

impl Renderer for ChromiumProcessRenderer {
    fn render<'a>(&'a self, url: &'a str, timeout_duration: Duration) -> RenderFuture<'a> {
        Box::pin(self.render_inner(url, timeout_duration))
    }
}
