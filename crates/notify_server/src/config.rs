use smart_default::SmartDefault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
pub struct StoreConfig {
    /// Lifetime in seconds for notifications that ask for the server default (`expire_timeout < 0`).
    #[default = 10]
    pub default_timeout: u32,

    /// Every lifetime is stretched by this factor. A single-line bar can only show one
    /// notification at a time, so they need to stay up longer than clients ask for.
    #[default = 2]
    pub expire_multiplier: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct NotifyConfig {
    /// Log every request and signal at info level instead of debug.
    pub debug: bool,

    pub store: StoreConfig,
}
