//! Dotenv-file token storage.
//!
//! Implements `bank_auth::oauth::token::Storage` on top of the same `.env` file the
//! server reads its configuration from. A credential key `AMEX` owns the lines
//! `AMEX_ACCESS_TOKEN`, `AMEX_REFRESH_TOKEN`, `AMEX_EXPIRES_AT`, `AMEX_SCOPE` and
//! `AMEX_USER_ID`. Writes replace exactly those lines in place, append the ones that are
//! missing and leave every other line (comments included) untouched.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bank_auth::error::{token_error, Error, ErrorKind, TokenErrorKind};
use bank_auth::oauth::token::{Storage, Tokens};
use chrono::{DateTime, Utc};
use log::*;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
const EXPIRES_AT: &str = "EXPIRES_AT";
const SCOPE: &str = "SCOPE";
const USER_ID: &str = "USER_ID";

fn storage_err(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
    Error {
        source: Some(source.into()),
        error_kind: ErrorKind::Token(TokenErrorKind::Storage),
    }
}

fn var_name(key: &str, field: &str) -> String {
    format!("{key}_{field}")
}

/// Token storage backed by a dotenv-style file.
///
/// All reads and writes go through one async mutex so a compare-and-swap sees the file
/// exactly as it writes it.
pub struct EnvFileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EnvFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed variables of the file; a missing file has none.
    fn read_vars(&self) -> Result<HashMap<String, String>, Error> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        dotenvy::from_path_iter(&self.path)
            .map_err(storage_err)?
            .map(|item| item.map_err(storage_err))
            .collect()
    }

    fn read_tokens(&self, key: &str) -> Result<Option<Tokens>, Error> {
        let mut vars = self.read_vars()?;
        let mut take = |field: &str| {
            vars.remove(&var_name(key, field))
                .filter(|value| !value.is_empty())
        };

        let Some(access_token) = take(ACCESS_TOKEN) else {
            return Ok(None);
        };

        let expires_at = take(EXPIRES_AT).and_then(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .inspect_err(|e| warn!("Ignoring unparseable {key}_{EXPIRES_AT}: {e}"))
                .ok()
        });

        Ok(Some(Tokens {
            access_token: SecretString::from(access_token),
            refresh_token: take(REFRESH_TOKEN).map(SecretString::from),
            expires_at,
            token_type: "Bearer".to_string(),
            scopes: take(SCOPE)
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            user_id: take(USER_ID),
        }))
    }

    async fn write_tokens(&self, key: &str, tokens: &Tokens) -> Result<(), Error> {
        let updates = vec![
            (
                var_name(key, ACCESS_TOKEN),
                tokens.access_token.expose_secret().to_string(),
            ),
            (
                var_name(key, REFRESH_TOKEN),
                tokens
                    .refresh_token
                    .as_ref()
                    .map(|t| t.expose_secret().to_string())
                    .unwrap_or_default(),
            ),
            (
                var_name(key, EXPIRES_AT),
                tokens
                    .expires_at
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            ),
            (var_name(key, SCOPE), tokens.scopes.join(" ")),
            (
                var_name(key, USER_ID),
                tokens.user_id.clone().unwrap_or_default(),
            ),
        ];

        let current = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(storage_err(e)),
        };

        let contents = rewrite_lines(&current, &updates);

        let mut tmp_path = OsString::from(self.path.as_os_str());
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(storage_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(storage_err)?;

        debug!("Wrote tokens for {} to {}", key, self.path.display());
        Ok(())
    }
}

/// Renders a value so `dotenvy` reads it back unchanged.
///
/// Plain tokens stay bare. Anything else is single-quoted, which `dotenvy` reads
/// literally, or double-quoted with escapes when it holds a single quote itself.
fn quote_value(value: &str) -> String {
    let bare = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._-:+/".contains(c));
    if bare {
        return value.to_string();
    }

    if !value.contains('\'') && !value.contains('\n') {
        return format!("'{value}'");
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Replaces `NAME=...` lines whose name matches an update exactly and appends the
/// updates that matched nothing.
fn rewrite_lines(current: &str, updates: &[(String, String)]) -> String {
    let mut written = vec![false; updates.len()];

    let mut lines: Vec<String> = current
        .lines()
        .map(|line| {
            let name = line
                .trim_start()
                .trim_start_matches("export ")
                .split_once('=')
                .map(|(name, _)| name.trim());

            match name.and_then(|name| updates.iter().position(|(key, _)| key == name)) {
                Some(index) => {
                    written[index] = true;
                    let (key, value) = &updates[index];
                    format!("{key}={}", quote_value(value))
                }
                None => line.to_string(),
            }
        })
        .collect();

    for (index, (key, value)) in updates.iter().enumerate() {
        if !written[index] {
            lines.push(format!("{key}={}", quote_value(value)));
        }
    }

    let mut contents = lines.join("\n");
    contents.push('\n');
    contents
}

#[async_trait]
impl Storage for EnvFileStorage {
    async fn store(&self, key: &str, tokens: Tokens) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        self.write_tokens(key, &tokens).await
    }

    async fn get(&self, key: &str) -> Result<Option<Tokens>, Error> {
        let _guard = self.lock.lock().await;
        self.read_tokens(key)
    }

    async fn update_atomic(
        &self,
        key: &str,
        old_refresh: Option<&str>,
        new_tokens: Tokens,
    ) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let current = self.read_tokens(key)?;
        let current_refresh = current
            .as_ref()
            .and_then(|t| t.refresh_token.as_ref())
            .map(|t| t.expose_secret().as_str());

        if current_refresh != old_refresh {
            return Err(token_error(
                TokenErrorKind::Stale,
                "Stored refresh token changed since it was read",
            ));
        }

        self.write_tokens(key, &new_tokens).await
    }
}
