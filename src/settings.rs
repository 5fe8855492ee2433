/// Name of the only option the plugin declares.
pub const FORCE_LEFT: &str = "forceLeft";

/// Read access to the host's settings storage.
pub trait Settings {
    fn get_bool(&self, name: &str) -> bool;
}

impl<T: Settings + ?Sized> Settings for &T {
    fn get_bool(&self, name: &str) -> bool {
        (**self).get_bool(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModSettings {
    /// Force left alignment while enabled, restore the original otherwise.
    pub force_left: bool,
}

impl Default for ModSettings {
    fn default() -> Self {
        Self { force_left: true }
    }
}

impl ModSettings {
    pub fn load(settings: &impl Settings) -> Self {
        Self {
            force_left: settings.get_bool(FORCE_LEFT),
        }
    }
}
