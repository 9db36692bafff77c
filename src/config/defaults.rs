pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_MIN_IDLE: u32 = 2;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hospital.local";
pub const DEFAULT_ADMIN_FULL_NAME: &str = "System Administrator";
