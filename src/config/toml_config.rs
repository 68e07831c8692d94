use crate::domain::ports::CmsConfig;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub cms: CmsSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub recommend: RecommendSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsSection {
    pub base_url: String,
    pub api_token: Option<String>,
    pub page_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    pub list_ttl_seconds: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            list_ttl_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendSection {
    pub similar_limit: Option<usize>,
}

impl Default for RecommendSection {
    fn default() -> Self {
        Self {
            similar_limit: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CatalogError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CatalogError::InvalidConfigValueError {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CMS_TOKEN})，找不到的變數原樣保留
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

        re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("cms.base_url", &self.cms.base_url)?;

        if let Some(page_size) = self.cms.page_size {
            validate_range("cms.page_size", page_size, 1, 100)?;
        }
        if let Some(timeout) = self.cms.timeout_seconds {
            validate_range("cms.timeout_seconds", timeout, 1, 300)?;
        }
        if let Some(limit) = self.recommend.similar_limit {
            validate_range("recommend.similar_limit", limit, 1, 50)?;
        }

        Ok(())
    }

    pub fn similar_limit(&self) -> usize {
        self.recommend.similar_limit.unwrap_or(5)
    }
}

impl CmsConfig for TomlConfig {
    fn base_url(&self) -> &str {
        &self.cms.base_url
    }

    fn api_token(&self) -> Option<&str> {
        self.cms.api_token.as_deref()
    }

    fn page_size(&self) -> usize {
        self.cms.page_size.unwrap_or(25)
    }

    fn timeout_seconds(&self) -> u64 {
        self.cms.timeout_seconds.unwrap_or(30)
    }

    fn list_ttl_seconds(&self) -> u64 {
        self.cache.list_ttl_seconds.unwrap_or(300)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[cms]
base_url = "https://cms.example.com"
page_size = 50
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.cms.base_url, "https://cms.example.com");
        assert_eq!(config.page_size(), 50);
        // 未指定的欄位用預設值
        assert_eq!(config.timeout_seconds(), 30);
        assert_eq!(config.list_ttl_seconds(), 300);
        assert_eq!(config.similar_limit(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BARKEEP_TEST_CMS_URL", "https://cms.test.example.com");

        let toml_content = r#"
[cms]
base_url = "${BARKEEP_TEST_CMS_URL}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.cms.base_url, "https://cms.test.example.com");

        std::env::remove_var("BARKEEP_TEST_CMS_URL");
    }

    #[test]
    fn test_unknown_env_var_is_left_as_is() {
        let toml_content = r#"
[cms]
base_url = "https://cms.example.com"
api_token = "${BARKEEP_NO_SUCH_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.cms.api_token.as_deref(), Some("${BARKEEP_NO_SUCH_VAR}"));
    }

    #[test]
    fn test_config_validation_rejects_bad_url_and_page_size() {
        let config = TomlConfig::from_toml_str(
            r#"
[cms]
base_url = "not-a-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[cms]
base_url = "https://cms.example.com"
page_size = 500
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[cms]
base_url = "https://cms.example.com"

[cache]
list_ttl_seconds = 60

[recommend]
similar_limit = 8
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.list_ttl_seconds(), 60);
        assert_eq!(config.similar_limit(), 8);
    }
}
