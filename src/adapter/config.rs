//! Runtime Configuration
//!
//! コンテナイメージが注入する環境変数から設定を読み込む

use thiserror::Error;

pub const PROJECT_ID_VAR: &str = "PROJECT_ID";
pub const DATASET_ID_VAR: &str = "DATASET_ID";
pub const TABLE_ID_VAR: &str = "TABLE_ID";
pub const SERVICE_ACCOUNT_KEY_PATH_VAR: &str = "SERVICE_ACCOUNT_KEY_PATH";
pub const LOAD_BATCH_SIZE_VAR: &str = "LOAD_BATCH_SIZE";

pub const DEFAULT_PROJECT_ID: &str = "still-worthy-453018-t6";
pub const DEFAULT_DATASET_ID: &str = "used_car_data";
pub const DEFAULT_TABLE_ID: &str = "otomoto_data";
pub const DEFAULT_LOAD_BATCH_SIZE: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is set but empty")]
    Empty(&'static str),
    #[error("environment variable {name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    /// `None` の場合は Application Default Credentials を使う
    pub service_account_key_path: Option<String>,
    pub load_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
            service_account_key_path: None,
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
        }
    }
}

fn required_or_default<F>(lookup: &F, name: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default.to_string()),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
        Some(value) => Ok(value.trim().to_string()),
    }
}

impl Config {
    /// プロセスの環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から読み込む
    ///
    /// 未設定の変数はデフォルト値、設定済みで空の変数はエラー
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = required_or_default(&lookup, PROJECT_ID_VAR, DEFAULT_PROJECT_ID)?;
        let dataset_id = required_or_default(&lookup, DATASET_ID_VAR, DEFAULT_DATASET_ID)?;
        let table_id = required_or_default(&lookup, TABLE_ID_VAR, DEFAULT_TABLE_ID)?;

        let service_account_key_path = match lookup(SERVICE_ACCOUNT_KEY_PATH_VAR) {
            None => None,
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Empty(SERVICE_ACCOUNT_KEY_PATH_VAR))
            }
            Some(path) => Some(path.trim().to_string()),
        };

        let load_batch_size = match lookup(LOAD_BATCH_SIZE_VAR) {
            None => DEFAULT_LOAD_BATCH_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        name: LOAD_BATCH_SIZE_VAR,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            project_id,
            dataset_id,
            table_id,
            service_account_key_path,
            load_batch_size,
        })
    }

    /// `project.dataset.table` 形式のテーブル参照
    pub fn table_ref(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }

    /// 解決済みの設定を環境変数名と値の組で返す
    pub fn env_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (PROJECT_ID_VAR, self.project_id.clone()),
            (DATASET_ID_VAR, self.dataset_id.clone()),
            (TABLE_ID_VAR, self.table_id.clone()),
        ];
        if let Some(path) = &self.service_account_key_path {
            pairs.push((SERVICE_ACCOUNT_KEY_PATH_VAR, path.clone()));
        }
        pairs.push((LOAD_BATCH_SIZE_VAR, self.load_batch_size.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.project_id, "still-worthy-453018-t6");
        assert_eq!(config.dataset_id, "used_car_data");
        assert_eq!(config.table_id, "otomoto_data");
        assert_eq!(config.service_account_key_path, None);
        assert_eq!(config.load_batch_size, 500);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PROJECT_ID", "my-project"),
            ("DATASET_ID", "cars"),
            ("TABLE_ID", "listings"),
            ("SERVICE_ACCOUNT_KEY_PATH", "./auth/still-worthy-key.json"),
            ("LOAD_BATCH_SIZE", "250"),
        ]))
        .unwrap();

        assert_eq!(config.table_ref(), "my-project.cars.listings");
        assert_eq!(
            config.service_account_key_path.as_deref(),
            Some("./auth/still-worthy-key.json")
        );
        assert_eq!(config.load_batch_size, 250);
    }

    #[test]
    fn test_empty_value_is_error() {
        let result = Config::from_lookup(lookup_from(&[("TABLE_ID", "  ")]));
        assert_eq!(result, Err(ConfigError::Empty("TABLE_ID")));
    }

    #[test]
    fn test_empty_key_path_is_error() {
        let result = Config::from_lookup(lookup_from(&[("SERVICE_ACCOUNT_KEY_PATH", "")]));
        assert_eq!(result, Err(ConfigError::Empty("SERVICE_ACCOUNT_KEY_PATH")));
    }

    #[test]
    fn test_invalid_batch_size() {
        for raw in ["zero", "0", "-5"] {
            let result = Config::from_lookup(lookup_from(&[("LOAD_BATCH_SIZE", raw)]));
            assert_eq!(
                result,
                Err(ConfigError::InvalidNumber {
                    name: "LOAD_BATCH_SIZE",
                    value: raw.to_string()
                })
            );
        }
    }

    #[test]
    fn test_env_pairs() {
        let mut config = Config::default();
        let names: Vec<_> = config.env_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["PROJECT_ID", "DATASET_ID", "TABLE_ID", "LOAD_BATCH_SIZE"]);

        config.service_account_key_path = Some("/app/auth/key.json".to_string());
        let pairs = config.env_pairs();
        assert!(pairs.contains(&("SERVICE_ACCOUNT_KEY_PATH", "/app/auth/key.json".to_string())));
    }
}
