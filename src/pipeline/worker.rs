//! Named worker threads whose panics surface as values.

use crate::error::Result;
use std::any::Any;
use std::thread::{self, JoinHandle};

/// A pipeline worker running on its own thread.
pub struct Worker<T> {
    handle: JoinHandle<Result<T>>,
    name: &'static str,
}

impl<T: Send + 'static> Worker<T> {
    /// Spawns `work` on a thread named after the worker.
    pub fn spawn<F>(name: &'static str, work: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("thoughtstream-{}", name))
            .spawn(move || {
                log::info!("{} worker started", name);
                let result = work();
                log::info!("{} worker finished (ok: {})", name, result.is_ok());
                result
            })?;
        Ok(Self { handle, name })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker. `Err` carries the panic message.
    pub fn join(self) -> std::result::Result<Result<T>, String> {
        self.handle
            .join()
            .map_err(|payload| panic_message(payload.as_ref()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
        .to_string()
}
