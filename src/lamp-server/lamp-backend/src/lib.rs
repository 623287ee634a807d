// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;

use lamp_app::normalize_name;
use lamp_core::{DynResult, LightDevice};

#[cfg(feature = "serial")]
mod serial;
mod virtual_lamp;

#[cfg(feature = "serial")]
pub use serial::SerialLamp;
pub use virtual_lamp::VirtualLamp;

pub const DEFAULT_BAUD: u32 = 9600;

/// Which light a backend should bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAccess {
    /// Index among the devices the backend can see. Used when no explicit
    /// port is given.
    pub index: usize,
    pub port: Option<String>,
    pub baud: u32,
}

impl Default for DeviceAccess {
    fn default() -> Self {
        Self {
            index: 0,
            port: None,
            baud: DEFAULT_BAUD,
        }
    }
}

pub type BackendFactory = fn(DeviceAccess) -> DynResult<Box<dyn LightDevice>>;

/// Named light backends.
#[derive(Clone, Default)]
pub struct RegistrationContext {
    factories: HashMap<String, BackendFactory>,
}

impl RegistrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a name. Names are compared after
    /// normalisation, so `"Serial-Lamp"` and `"seriallamp"` collide.
    pub fn register_backend(&mut self, name: &str, factory: BackendFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_backend_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn build_device(&self, name: &str, access: DeviceAccess) -> DynResult<Box<dyn LightDevice>> {
        let factory = self
            .factories
            .get(&normalize_name(name))
            .ok_or_else(|| format!("Unknown light backend: {}", name))?;
        factory(access)
    }
}

pub fn register_builtin_backends_on(context: &mut RegistrationContext) {
    context.register_backend("virtual", virtual_factory);
    #[cfg(feature = "serial")]
    context.register_backend("serial", serial_factory);
}

fn virtual_factory(access: DeviceAccess) -> DynResult<Box<dyn LightDevice>> {
    Ok(Box::new(VirtualLamp::new(access.index)))
}

#[cfg(feature = "serial")]
fn serial_factory(access: DeviceAccess) -> DynResult<Box<dyn LightDevice>> {
    Ok(Box::new(SerialLamp::from_access(&access)?))
}
