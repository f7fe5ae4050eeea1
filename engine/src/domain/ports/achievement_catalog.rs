//! Port for reading achievement definitions.

use async_trait::async_trait;

use crate::domain::AchievementDefinition;

use super::define_port_error;

define_port_error! {
    /// Errors raised by achievement catalog adapters.
    pub enum AchievementCatalogError {
        /// The catalog could not be read.
        Unavailable { message: String } =>
            "achievement catalog unavailable: {message}",
    }
}

/// Port listing the achievement definitions currently in force.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementCatalog: Send + Sync {
    /// Definitions with `is_active` set, in catalog order.
    async fn list_active(&self) -> Result<Vec<AchievementDefinition>, AchievementCatalogError>;
}

/// Fixture catalog holding no definitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAchievementCatalog;

#[async_trait]
impl AchievementCatalog for FixtureAchievementCatalog {
    async fn list_active(&self) -> Result<Vec<AchievementDefinition>, AchievementCatalogError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_catalog_is_empty() {
        let catalog = FixtureAchievementCatalog;
        let listed = catalog.list_active().await.expect("fixture list succeeds");
        assert!(listed.is_empty());
    }

    #[rstest]
    fn unavailable_formats_message() {
        let err = AchievementCatalogError::unavailable("timeout");
        assert_eq!(err.to_string(), "achievement catalog unavailable: timeout");
    }
}
