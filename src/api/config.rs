use std::{env, path::PathBuf, str::FromStr};

use log::LevelFilter;

use super::err::{Result, SchoolError};

/// What the nested hierarchy does with a class that lacks exactly one teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeacherPolicy {
    /// Drop classes without a teacher; keep the first teacher by name.
    #[default]
    Lenient,
    /// Reject both cases with an aggregation error.
    Strict,
}

/// What a new score record gets when its subject has no credit mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreditPolicy {
    #[default]
    Zero,
    Reject,
}

impl FromStr for TeacherPolicy {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(TeacherPolicy::Lenient),
            "strict" => Ok(TeacherPolicy::Strict),
            other => Err(SchoolError::Config(format!("unknown teacher policy {other:?}"))),
        }
    }
}

impl FromStr for CreditPolicy {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(CreditPolicy::Zero),
            "reject" => Ok(CreditPolicy::Reject),
            other => Err(SchoolError::Config(format!("unknown credit policy {other:?}"))),
        }
    }
}

/// 运行配置
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub log_level: LevelFilter,
    pub fixtures_dir: Option<PathBuf>,
    pub teacher_policy: TeacherPolicy,
    pub credit_policy: CreditPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://school.db".to_string(),
            log_level: LevelFilter::Info,
            fixtures_dir: None,
            teacher_policy: TeacherPolicy::default(),
            credit_policy: CreditPolicy::default(),
        }
    }
}

impl Settings {
    /// Reads the settings from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(url) = lookup("DATABASE_URL") {
            settings.database_url = url;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            settings.log_level = level
                .parse()
                .map_err(|_| SchoolError::Config(format!("unknown log level {level:?}")))?;
        }
        settings.fixtures_dir = lookup("FIXTURES_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        if let Some(policy) = lookup("TEACHER_POLICY") {
            settings.teacher_policy = policy.parse()?;
        }
        if let Some(policy) = lookup("CREDIT_POLICY") {
            settings.credit_policy = policy.parse()?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.database_url, "sqlite://school.db");
        assert_eq!(settings.log_level, LevelFilter::Info);
        assert_eq!(settings.teacher_policy, TeacherPolicy::Lenient);
        assert_eq!(settings.credit_policy, CreditPolicy::Zero);
        assert!(settings.fixtures_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("DATABASE_URL", "sqlite://other.db"),
            ("LOG_LEVEL", "debug"),
            ("FIXTURES_DIR", "seed"),
            ("TEACHER_POLICY", "Strict"),
            ("CREDIT_POLICY", "reject"),
        ])
        .unwrap();
        assert_eq!(settings.database_url, "sqlite://other.db");
        assert_eq!(settings.log_level, LevelFilter::Debug);
        assert_eq!(settings.fixtures_dir, Some(PathBuf::from("seed")));
        assert_eq!(settings.teacher_policy, TeacherPolicy::Strict);
        assert_eq!(settings.credit_policy, CreditPolicy::Reject);
    }

    #[test]
    fn test_bad_policy() {
        let result = settings_from(&[("CREDIT_POLICY", "maybe")]);
        assert!(matches!(result, Err(SchoolError::Config(_))));
    }
}
