mod variant;

pub use variant::{EventDelivery, Family, MonitorConfig, UserLed, Variant};

/// Series this firmware image was built for.
pub const VARIANT: Variant = Variant::selected();

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FIRMWARE_COMMIT: &str = env!("XMCBOD_COMMIT");
