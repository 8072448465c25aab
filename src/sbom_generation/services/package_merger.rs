use crate::sbom_generation::domain::{IndexResult, Location, Package};
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::{BTreeMap, HashSet};

/// Identity of a package across scanners
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum MergeKey {
    Purl(String),
    Coordinates(String, String, String, String),
}

impl MergeKey {
    fn of(package: &Package) -> Self {
        if package.purl.is_empty() {
            MergeKey::Coordinates(
                package.package_type.clone(),
                package.namespace.clone().unwrap_or_default(),
                package.name.clone(),
                package.version.clone(),
            )
        } else {
            MergeKey::Purl(package.purl.clone())
        }
    }
}

/// PackageMerger service for combining two normalized scanner results
///
/// The secondary (general package) scanner seeds the result; the primary
/// (vulnerability-oriented) scanner is laid over it. On a key collision the
/// primary's descriptive fields win wherever the primary reports a value,
/// and the location lists of both sides are unioned. Every distinct key
/// from either side appears exactly once in the output, ordered by key.
pub struct PackageMerger;

impl PackageMerger {
    /// Merges two scanner results.
    ///
    /// # Errors
    /// Returns `SbomError::Scan` if either result did not succeed; there is
    /// no partial-scanner package list.
    pub fn merge(primary: IndexResult, secondary: IndexResult) -> Result<Vec<Package>> {
        Self::ensure_success(&secondary)?;
        Self::ensure_success(&primary)?;

        let mut merged: BTreeMap<MergeKey, Package> = BTreeMap::new();

        for package in secondary.packages {
            Self::fold(&mut merged, package, false);
        }
        for package in primary.packages {
            Self::fold(&mut merged, package, true);
        }

        Ok(merged.into_values().collect())
    }

    fn fold(merged: &mut BTreeMap<MergeKey, Package>, mut package: Package, overrides: bool) {
        let key = MergeKey::of(&package);
        match merged.get_mut(&key) {
            Some(existing) => Self::absorb(existing, package, overrides),
            None => {
                package.locations = union_locations(Vec::new(), package.locations);
                package.files = union_locations(Vec::new(), package.files);
                merged.insert(key, package);
            }
        }
    }

    fn ensure_success(result: &IndexResult) -> Result<()> {
        if result.is_success() {
            return Ok(());
        }
        Err(SbomError::Scan {
            scanner: result.scanner.clone(),
            image: String::new(),
            details: result
                .error
                .clone()
                .unwrap_or_else(|| "scanner reported failure".to_string()),
        }
        .into())
    }

    /// Folds `incoming` into `existing`. With `overrides` set, present
    /// descriptive fields of `incoming` replace those of `existing`;
    /// otherwise they only fill gaps.
    fn absorb(existing: &mut Package, incoming: Package, overrides: bool) {
        fn pick<T>(current: &mut Option<T>, candidate: Option<T>, overrides: bool) {
            if candidate.is_some() && (overrides || current.is_none()) {
                *current = candidate;
            }
        }

        pick(&mut existing.author, incoming.author, overrides);
        pick(&mut existing.description, incoming.description, overrides);
        pick(&mut existing.url, incoming.url, overrides);
        pick(&mut existing.size, incoming.size, overrides);
        pick(
            &mut existing.installed_size,
            incoming.installed_size,
            overrides,
        );
        pick(&mut existing.parent, incoming.parent, false);

        if !incoming.licenses.is_empty() && (overrides || existing.licenses.is_empty()) {
            existing.licenses = incoming.licenses;
        }

        existing.locations =
            union_locations(std::mem::take(&mut existing.locations), incoming.locations);
        existing.files = union_locations(std::mem::take(&mut existing.files), incoming.files);
    }
}

/// Union of two location lists, unique by (path, digest) and in first-seen
/// order. A missing diff ID is filled from a duplicate that carries one.
fn union_locations(existing: Vec<Location>, incoming: Vec<Location>) -> Vec<Location> {
    let mut union: Vec<Location> = Vec::with_capacity(existing.len() + incoming.len());
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for location in existing.into_iter().chain(incoming) {
        if seen.insert((location.path.clone(), location.digest.clone())) {
            union.push(location);
        } else if let Some(current) = union
            .iter_mut()
            .find(|l| l.dedup_key() == location.dedup_key() && l.diff_id.is_empty())
        {
            current.diff_id = location.diff_id;
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::Distro;
    use std::collections::BTreeSet;

    fn musl(description: &str, location: Location) -> Package {
        let mut package = Package::new("alpine", "musl", "1.2.3")
            .with_namespace("alpine")
            .with_purl("pkg:apk/musl@1.2.3")
            .with_location(location);
        package.description = Some(description.to_string());
        package
    }

    fn result(scanner: &str, packages: Vec<Package>) -> IndexResult {
        IndexResult::success(scanner, packages, Distro::default())
    }

    fn purls(packages: &[Package]) -> BTreeSet<String> {
        packages.iter().map(|p| p.purl.clone()).collect()
    }

    #[test]
    fn test_collision_keeps_primary_description_and_both_locations() {
        let primary = result(
            "trivy",
            vec![musl(
                "the musl c library (trivy)",
                Location::new("/lib/ld-musl-x86_64.so.1", "sha256:d0", "sha256:f0"),
            )],
        );
        let secondary = result(
            "syft",
            vec![musl(
                "the musl c library (syft)",
                Location::new("/lib/apk/db/installed", "sha256:d0", "sha256:f0"),
            )],
        );

        let merged = PackageMerger::merge(primary, secondary).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].description.as_deref(),
            Some("the musl c library (trivy)")
        );
        assert_eq!(merged[0].locations.len(), 2);
    }

    #[test]
    fn test_primary_author_wins_and_locations_are_deduplicated() {
        let shared = Location::new("/usr/lib/node_modules/npm", "sha256:d1", "sha256:f1");
        let mut from_primary = Package::new("npm", "npm", "9.6.7")
            .with_purl("pkg:npm/npm@9.6.7")
            .with_location(shared.clone());
        from_primary.author = Some("GitHub Inc.".to_string());
        let mut from_secondary = Package::new("npm", "npm", "9.6.7")
            .with_purl("pkg:npm/npm@9.6.7")
            .with_location(shared.clone())
            .with_location(Location::new("/usr/bin/npm", "sha256:d1", "sha256:f1"));
        from_secondary.author = Some("npm, Inc.".to_string());

        let merged = PackageMerger::merge(
            result("trivy", vec![from_primary]),
            result("syft", vec![from_secondary]),
        )
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].author.as_deref(), Some("GitHub Inc."));
        assert_eq!(merged[0].locations.len(), 2);
        let unique: HashSet<_> = merged[0].locations.iter().map(|l| l.dedup_key()).collect();
        assert_eq!(unique.len(), merged[0].locations.len());
    }

    #[test]
    fn test_missing_primary_fields_do_not_erase_secondary() {
        let primary = Package::new("gem", "rake", "13.0.6").with_purl("pkg:gem/rake@13.0.6");
        let mut secondary = primary.clone();
        secondary.url = Some("https://github.com/ruby/rake".to_string());
        secondary.licenses = vec!["MIT".to_string()];

        let merged = PackageMerger::merge(
            result("trivy", vec![primary]),
            result("syft", vec![secondary]),
        )
        .unwrap();

        assert_eq!(
            merged[0].url.as_deref(),
            Some("https://github.com/ruby/rake")
        );
        assert_eq!(merged[0].licenses, vec!["MIT".to_string()]);
    }

    #[test]
    fn test_no_package_is_dropped() {
        let primary = result(
            "trivy",
            vec![
                Package::new("npm", "a", "1").with_purl("pkg:npm/a@1"),
                Package::new("npm", "b", "1").with_purl("pkg:npm/b@1"),
            ],
        );
        let secondary = result(
            "syft",
            vec![
                Package::new("npm", "b", "1").with_purl("pkg:npm/b@1"),
                Package::new("npm", "c", "1").with_purl("pkg:npm/c@1"),
            ],
        );

        let merged = PackageMerger::merge(primary, secondary).unwrap();
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_is_commutative_on_purl_set() {
        let left = vec![
            Package::new("npm", "a", "1").with_purl("pkg:npm/a@1"),
            Package::new("gem", "rake", "13.0.6").with_purl("pkg:gem/rake@13.0.6"),
        ];
        let right = vec![
            Package::new("gem", "rake", "13.0.6").with_purl("pkg:gem/rake@13.0.6"),
            Package::new("pypi", "requests", "2.31.0").with_purl("pkg:pypi/requests@2.31.0"),
        ];

        let forward =
            PackageMerger::merge(result("x", left.clone()), result("y", right.clone())).unwrap();
        let backward = PackageMerger::merge(result("y", right), result("x", left)).unwrap();

        assert_eq!(purls(&forward), purls(&backward));
    }

    #[test]
    fn test_duplicates_within_one_source_collapse() {
        let secondary = result(
            "syft",
            vec![
                Package::new("pypi", "pip", "23.0")
                    .with_purl("pkg:pypi/pip@23.0")
                    .with_location(Location::new("/a", "sha256:d0", "sha256:f0")),
                Package::new("pypi", "pip", "23.0")
                    .with_purl("pkg:pypi/pip@23.0")
                    .with_location(Location::new("/b", "sha256:d0", "sha256:f0")),
            ],
        );

        let merged = PackageMerger::merge(result("trivy", vec![]), secondary).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].locations.len(), 2);
    }

    #[test]
    fn test_falls_back_to_coordinates_without_purl() {
        let primary = result("trivy", vec![Package::new("conan", "zlib", "1.3")]);
        let secondary = result("syft", vec![Package::new("conan", "zlib", "1.3")]);

        let merged = PackageMerger::merge(primary, secondary).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_failed_input_is_a_scan_error() {
        let primary = IndexResult::failed("trivy", "engine crashed");
        let secondary = result("syft", vec![]);

        let err = PackageMerger::merge(primary, secondary).unwrap_err();
        match err.downcast_ref::<SbomError>() {
            Some(SbomError::Scan {
                scanner,
                details,
                ..
            }) => {
                assert_eq!(scanner, "trivy");
                assert_eq!(details, "engine crashed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_union_fills_missing_diff_id() {
        let existing = vec![Location::new("/x", "sha256:d0", "")];
        let union = union_locations(
            existing,
            vec![Location::new("/x", "sha256:d0", "sha256:f0")],
        );
        assert_eq!(union.len(), 1);
        assert_eq!(union[0].diff_id, "sha256:f0");
    }

    #[test]
    fn test_repeated_locations_in_one_package_are_collapsed() {
        let repeated = Location::new("/x", "sha256:d", "sha256:f");
        let secondary = result(
            "syft",
            vec![Package::new("npm", "a", "1")
                .with_purl("pkg:npm/a@1")
                .with_location(repeated.clone())
                .with_location(repeated.clone())],
        );
        let primary = result(
            "trivy",
            vec![Package::new("npm", "a", "1").with_purl("pkg:npm/a@1")],
        );

        let merged = PackageMerger::merge(primary, secondary).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].locations, vec![repeated]);
    }

    #[test]
    fn test_repeated_files_in_unmatched_package_are_collapsed() {
        let mut package = Package::new("gem", "rake", "13.0.6").with_purl("pkg:gem/rake@13.0.6");
        package.files = vec![
            Location::new("/usr/bin/rake", "sha256:d", ""),
            Location::new("/usr/bin/rake", "sha256:d", "sha256:f"),
        ];

        let merged = PackageMerger::merge(result("trivy", vec![package]), result("syft", vec![]))
            .unwrap();

        assert_eq!(merged[0].files.len(), 1);
        assert_eq!(merged[0].files[0].diff_id, "sha256:f");
    }
}
