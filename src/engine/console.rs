use crate::engine::{Key, KeyActuator};
use log::info;

/// Logs key transitions instead of injecting them. Used where no input backend is available.
#[derive(Clone, Debug, Default)]
pub struct ConsoleActuator;

impl ConsoleActuator {
    pub fn new() -> Self {
        Self
    }
}

impl KeyActuator for ConsoleActuator {
    fn key_down(&self, key: Key) -> anyhow::Result<()> {
        info!("key_down {:?}", key);
        Ok(())
    }

    fn key_up(&self, key: Key) -> anyhow::Result<()> {
        info!("key_up {:?}", key);
        Ok(())
    }
}
