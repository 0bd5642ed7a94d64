pub mod capture;
pub mod composite;
pub mod icons;
pub mod keyboard_hook;
pub mod monitor;
pub mod overlay;
pub mod render;
pub mod scene;
pub mod service;
pub mod settings;
pub mod settings_store;
pub mod sprite;
pub mod state;
pub mod timer;

pub use capture::{DesktopCapture, FrameSource};
pub use icons::IconSet;
pub use monitor::MonitorRect;
pub use overlay::OverlayWindow;
pub use scene::{Scene, SceneConfig, TickReport};
pub use service::{run, ExitReason, MeltSession};
pub use settings::MeltSettings;
