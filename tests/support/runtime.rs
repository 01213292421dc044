//! Tokio runtime and mock GitHub server shared by BDD steps.
//!
//! Step functions are synchronous, so each scenario keeps one runtime in a
//! `Slot` and drives async work through [`SharedRuntime::block_on`].

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use rstest_bdd::Slot;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer};

/// Runtime handle that can be stored in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<RefCell<Runtime>>);

impl SharedRuntime {
    /// Wraps `runtime` for sharing between steps.
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(RefCell::new(runtime)))
    }

    /// Runs `future` to completion on the shared runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.borrow().block_on(future)
    }
}

/// Starts the runtime and mock GitHub server on first use.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created.
pub fn ensure_runtime_and_server(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
) -> Result<SharedRuntime, io::Error> {
    if runtime.with_ref(|_| ()).is_none() {
        runtime.set(SharedRuntime::new(Runtime::new()?));
    }
    let shared = runtime
        .get()
        .ok_or_else(|| io::Error::other("runtime not initialised after set"))?;

    if server.with_ref(|_| ()).is_none() {
        server.set(shared.block_on(MockServer::start()));
    }
    Ok(shared)
}

/// Mounts `mock` on the scenario's server.
///
/// # Errors
///
/// Returns an error if the runtime or server cannot be started.
pub fn mount(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
    mock: Mock,
) -> Result<(), io::Error> {
    let shared = ensure_runtime_and_server(runtime, server)?;
    server
        .with_ref(|started| shared.block_on(mock.mount(started)))
        .ok_or_else(|| io::Error::other("mock server not initialised"))
}
