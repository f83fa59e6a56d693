use std::collections::HashSet;
use std::env;

use engine::store::DEFAULT_COMMAND_BUFFER;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
/// 0.01 SOL
pub const DEFAULT_MIN_BET_LAMPORTS: u64 = 10_000_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub admin_addresses: HashSet<String>,
    pub min_bet_lamports: u64,
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            redis_url: None,
            admin_addresses: HashSet::new(),
            min_bet_lamports: DEFAULT_MIN_BET_LAMPORTS,
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        let admin_addresses = lookup("ADMIN_ADDRESSES")
            .map(|raw| parse_addresses(&raw))
            .unwrap_or_default();

        let min_bet_lamports = match lookup("MIN_BET_LAMPORTS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("MIN_BET_LAMPORTS must be an integer: {}", e))?,
            None => defaults.min_bet_lamports,
        };
        let command_buffer = match lookup("COMMAND_BUFFER") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "COMMAND_BUFFER must be a positive integer".to_string())?,
            None => defaults.command_buffer,
        };

        Ok(Self {
            bind_addr,
            redis_url,
            admin_addresses,
            min_bet_lamports,
            command_buffer,
        })
    }

    pub fn is_admin(&self, address: &str) -> bool {
        self.admin_addresses.contains(address)
    }
}

fn parse_addresses(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
