//! 服务配置
//! 默认值 + GATEKEEPER_* 环境变量，密钥类字段以 Secret 保存

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// 初始管理员的占位密码，开启 seed 时必须替换
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin123!";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 关闭后释放连接池等资源的最长等待（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// json | pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC 签名密钥，至少 32 字符
    pub jwt_secret: Secret<String>,
    /// HS256 | HS384 | HS512
    pub jwt_algorithm: String,
    pub access_token_exp_secs: u64,
    pub refresh_token_exp_secs: u64,
    // 密码策略
    pub password_min_length: usize,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_digit: bool,
    pub password_require_special: bool,
    /// Argon2 内存开销（KiB）
    pub password_hash_memory_kib: u32,
    /// Argon2 迭代次数
    pub password_hash_iterations: u32,
    /// Argon2 并行度
    pub password_hash_parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenylistConfig {
    /// 撤销列表后端: postgres, memory
    pub backend: String,
    /// 过期条目清理间隔（秒）
    pub purge_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// 启动时是否写入初始角色与管理员
    pub seed: bool,
    /// 初始管理员邮箱
    pub admin_email: String,
    /// 初始管理员密码（使用 Secret 包装）
    pub admin_password: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub denylist: DenylistConfig,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    /// 读取默认值与 GATEKEEPER_* 环境变量，并校验
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", "change-this-secret-in-production-min-32-chars!")?
            .set_default("security.jwt_algorithm", "HS256")?
            .set_default("security.access_token_exp_secs", 1800)?
            .set_default("security.refresh_token_exp_secs", 604800)?
            .set_default("security.password_min_length", 8)?
            .set_default("security.password_require_uppercase", true)?
            .set_default("security.password_require_lowercase", true)?
            .set_default("security.password_require_digit", true)?
            .set_default("security.password_require_special", true)?
            .set_default("security.password_hash_memory_kib", 65536)?
            .set_default("security.password_hash_iterations", 3)?
            .set_default("security.password_hash_parallelism", 4)?
            .set_default("denylist.backend", "postgres")?
            .set_default("denylist.purge_interval_secs", 300)?
            .set_default("bootstrap.seed", false)?
            .set_default("bootstrap.admin_email", "admin@example.com")?
            .set_default("bootstrap.admin_password", DEFAULT_ADMIN_PASSWORD)?
            // GATEKEEPER_SECURITY__JWT_SECRET -> security.jwt_secret
            .add_source(
                Environment::with_prefix("GATEKEEPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// 逐段校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        self.denylist.validate()?;
        self.bootstrap.validate()
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let port = self
            .addr
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok());

        match port {
            Some(port) if port != 0 && port < 1024 => Err(invalid(format!(
                "server.addr uses privileged port {}; use a port >= 1024",
                port
            ))),
            _ => Ok(()),
        }
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_connections > self.max_connections {
            return Err(invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        one_of("logging.level", &self.level, &["trace", "debug", "info", "warn", "error"])?;
        one_of("logging.format", &self.format, &["json", "pretty"])
    }
}

impl SecurityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose_secret().len() < 32 {
            return Err(invalid("security.jwt_secret must be at least 32 characters"));
        }

        // 仅支持 HMAC 系列
        one_of("security.jwt_algorithm", &self.jwt_algorithm, &["hs256", "hs384", "hs512"])?;

        if !(60..=86_400).contains(&self.access_token_exp_secs) {
            return Err(invalid("security.access_token_exp_secs must be within 60..=86400"));
        }
        if !(3_600..=2_592_000).contains(&self.refresh_token_exp_secs) {
            return Err(invalid("security.refresh_token_exp_secs must be within 3600..=2592000"));
        }
        if self.refresh_token_exp_secs <= self.access_token_exp_secs {
            return Err(invalid("refresh tokens must outlive access tokens"));
        }

        if !(6..=128).contains(&self.password_min_length) {
            return Err(invalid("security.password_min_length must be within 6..=128"));
        }
        Ok(())
    }
}

impl DenylistConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        one_of("denylist.backend", &self.backend, &["postgres", "memory"])?;

        if self.purge_interval_secs == 0 {
            return Err(invalid("denylist.purge_interval_secs must be positive"));
        }
        Ok(())
    }
}

impl BootstrapConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.seed {
            return Ok(());
        }
        if self.admin_password.expose_secret() == DEFAULT_ADMIN_PASSWORD {
            return Err(invalid(
                "bootstrap.admin_password must be set when bootstrap.seed is enabled",
            ));
        }
        if !self.admin_email.contains('@') {
            return Err(invalid("bootstrap.admin_email must be an email address"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Message(msg.into())
}

/// 大小写不敏感的枚举值检查
fn one_of(key: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{} = {:?} is not one of: {}",
            key,
            value,
            allowed.join(", ")
        )))
    }
}
