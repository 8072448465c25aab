use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::HashMap;
use tracing::debug;

/// Bidirectional index between an image's layer digests and diff IDs.
///
/// Layer *i* of the manifest corresponds to diff ID *i* of the config. The
/// mapping is built once per index run and never mutated afterwards.
/// When an image repeats a layer, the reverse lookups resolve to the
/// highest ordinal carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMapping {
    by_diff_id: HashMap<String, String>,
    by_digest: HashMap<String, String>,
    ordinal_by_diff_id: HashMap<String, usize>,
    diff_id_by_ordinal: Vec<String>,
    digest_by_ordinal: Vec<String>,
}

impl LayerMapping {
    /// Builds the mapping from the manifest layer digests and the config
    /// diff IDs.
    ///
    /// # Errors
    /// Returns `SbomError::LayerMapping` when the two lists differ in length,
    /// which means the image manifest is malformed.
    pub fn new(image_digest: &str, layer_digests: &[String], diff_ids: &[String]) -> Result<Self> {
        if layer_digests.len() != diff_ids.len() {
            return Err(SbomError::LayerMapping {
                digest: image_digest.to_string(),
                layers: layer_digests.len(),
                diff_ids: diff_ids.len(),
            }
            .into());
        }

        let count = layer_digests.len();
        let mut mapping = Self {
            by_diff_id: HashMap::with_capacity(count),
            by_digest: HashMap::with_capacity(count),
            ordinal_by_diff_id: HashMap::with_capacity(count),
            diff_id_by_ordinal: Vec::with_capacity(count),
            digest_by_ordinal: Vec::with_capacity(count),
        };

        for (ordinal, (digest, diff_id)) in layer_digests.iter().zip(diff_ids).enumerate() {
            mapping.by_diff_id.insert(diff_id.clone(), digest.clone());
            mapping.by_digest.insert(digest.clone(), diff_id.clone());
            mapping.ordinal_by_diff_id.insert(diff_id.clone(), ordinal);
            mapping.diff_id_by_ordinal.push(diff_id.clone());
            mapping.digest_by_ordinal.push(digest.clone());
        }

        debug!(
            digest = image_digest,
            layers = count,
            "Created layer mapping"
        );
        Ok(mapping)
    }

    /// Number of layers in the image
    pub fn len(&self) -> usize {
        self.digest_by_ordinal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digest_by_ordinal.is_empty()
    }

    pub fn digest_for_diff_id(&self, diff_id: &str) -> Option<&str> {
        self.by_diff_id.get(diff_id).map(String::as_str)
    }

    pub fn diff_id_for_digest(&self, digest: &str) -> Option<&str> {
        self.by_digest.get(digest).map(String::as_str)
    }

    pub fn ordinal_of_diff_id(&self, diff_id: &str) -> Option<usize> {
        self.ordinal_by_diff_id.get(diff_id).copied()
    }

    pub fn digest_at(&self, ordinal: usize) -> Option<&str> {
        self.digest_by_ordinal.get(ordinal).map(String::as_str)
    }

    pub fn diff_id_at(&self, ordinal: usize) -> Option<&str> {
        self.diff_id_by_ordinal.get(ordinal).map(String::as_str)
    }

    /// Fills in whichever layer identifier is missing.
    ///
    /// Engines report either the compressed digest, the diff ID, or both;
    /// the result always carries both when the layer is part of this image.
    pub fn complete(&self, digest: &str, diff_id: &str) -> (String, String) {
        let digest = if digest.is_empty() {
            self.digest_for_diff_id(diff_id).unwrap_or_default()
        } else {
            digest
        };
        let diff_id = if diff_id.is_empty() {
            self.diff_id_for_digest(digest).unwrap_or_default()
        } else {
            diff_id
        };
        (digest.to_string(), diff_id.to_string())
    }

    /// Cardinalities of the five tables, in declaration order.
    #[cfg(test)]
    fn table_sizes(&self) -> [usize; 5] {
        [
            self.by_diff_id.len(),
            self.by_digest.len(),
            self.ordinal_by_diff_id.len(),
            self.diff_id_by_ordinal.len(),
            self.digest_by_ordinal.len(),
        ]
    }
}
