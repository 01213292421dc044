//! Authentication: the OAuth device flow and bearer-token storage.

pub mod device_flow;
mod error;
pub mod secret_store;

pub use device_flow::{
    DeviceAuthFlow, DeviceCodeGrant, DeviceFlowOutcome, DeviceFlowSettings, DeviceFlowState,
    PollInterval,
};
pub use error::{DeviceFlowError, SecretStoreError};
pub use secret_store::{AuthMethod, FileSecretStore, MemorySecretStore, SecretStore};
