use crate::sbom_generation::domain::{IndexResult, Package};
use crate::sbom_generation::policies::NormalizationTables;
use crate::shared::error::SbomError;
use crate::shared::Result;

/// PackageNormalizer service for rewriting scanner output into the
/// canonical vocabulary
///
/// Rewrites each package's type and namespace through the
/// `NormalizationTables`, then recomputes its purl from the rewritten
/// coordinates. Normalizing an already-normalized list is a no-op.
#[derive(Debug, Clone, Default)]
pub struct PackageNormalizer {
    tables: NormalizationTables,
}

impl PackageNormalizer {
    pub fn new(tables: NormalizationTables) -> Self {
        Self { tables }
    }

    /// Normalizes a whole batch.
    ///
    /// # Errors
    /// Returns `SbomError::Normalization` for the first package missing a
    /// name or version. No package of the batch is returned in that case.
    pub fn normalize(&self, scanner: &str, packages: Vec<Package>) -> Result<Vec<Package>> {
        Self::validate(scanner, &packages)?;
        Ok(packages
            .into_iter()
            .map(|package| self.normalize_package(package))
            .collect())
    }

    /// Normalizes the package list of a scanner result in place.
    pub fn normalize_result(&self, mut result: IndexResult) -> Result<IndexResult> {
        let packages = std::mem::take(&mut result.packages);
        result.packages = self.normalize(&result.scanner, packages)?;
        Ok(result)
    }

    fn validate(scanner: &str, packages: &[Package]) -> Result<()> {
        for (index, package) in packages.iter().enumerate() {
            let missing = if package.name.trim().is_empty() {
                Some("name")
            } else if package.version.trim().is_empty() {
                Some("version")
            } else {
                None
            };

            if let Some(field) = missing {
                return Err(SbomError::Normalization {
                    scanner: scanner.to_string(),
                    index,
                    field,
                }
                .into());
            }
        }
        Ok(())
    }

    fn normalize_package(&self, mut package: Package) -> Package {
        package.package_type = self.tables.map_type(&package.package_type).to_string();
        package.namespace = package
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .map(|ns| self.tables.map_namespace(ns).to_string());
        package.purl = package.derive_purl().to_string();
        package
    }
}
