// src/registry/listener.rs

use crate::config::ActivityConfig;
use crate::types::DataCmd;

/// Receives every registry mutation (`Add` or `Delete`).
///
/// Called after the registry has released its shard locks, so listeners may
/// read the registry again.
pub trait RegistryListener: Send + Sync {
    fn on_change(&self, config: &ActivityConfig, cmd: DataCmd);
}

impl<F> RegistryListener for F
where
    F: Fn(&ActivityConfig, DataCmd) + Send + Sync,
{
    fn on_change(&self, config: &ActivityConfig, cmd: DataCmd) {
        self(config, cmd)
    }
}
