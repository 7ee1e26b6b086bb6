//! Status icons shared by the command handlers and the interactive session

/// Status indicators
pub struct StatusIcons;

impl StatusIcons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const INFO: &'static str = "ℹ";
    pub const EXPORT: &'static str = "📤";
    pub const JOYSTICK: &'static str = "🕹";
}
