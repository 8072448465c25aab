use std::fs;
use std::path::Path;

pub const MANIFEST_HEX: &str = "9e1f5a3c7b2d4e6f8a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f";
pub const CONFIG_HEX: &str = "8d0e4f2b6a1c3d5e7f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e";
pub const LAYER_HEX: &str = "7c9d3e1a5f0b2c4d6e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d";
pub const DIFF_ID_HEX: &str = "6b8c2d0f4e9a1b3c5d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c";

pub fn manifest_digest() -> String {
    format!("sha256:{}", MANIFEST_HEX)
}

pub fn layer_digest() -> String {
    format!("sha256:{}", LAYER_HEX)
}

pub fn diff_id() -> String {
    format!("sha256:{}", DIFF_ID_HEX)
}

/// Writes a single-layer linux/amd64 OCI image layout tagged with `tag`
pub fn write_layout(root: &Path, tag: &str) {
    let blobs = root.join("blobs").join("sha256");
    fs::create_dir_all(&blobs).unwrap();
    fs::write(root.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();

    let config = format!(
        r#"{{"architecture":"amd64","os":"linux","config":{{"Env":["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],"Cmd":["/bin/sh"]}},"rootfs":{{"type":"layers","diff_ids":["{}"]}}}}"#,
        diff_id()
    );
    fs::write(blobs.join(CONFIG_HEX), &config).unwrap();

    let manifest = format!(
        r#"{{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json","config":{{"mediaType":"application/vnd.oci.image.config.v1+json","digest":"sha256:{}","size":{}}},"layers":[{{"mediaType":"application/vnd.oci.image.layer.v1.tar+gzip","digest":"{}","size":3408729}}]}}"#,
        CONFIG_HEX,
        config.len(),
        layer_digest()
    );
    fs::write(blobs.join(MANIFEST_HEX), &manifest).unwrap();

    let index = format!(
        r#"{{"schemaVersion":2,"manifests":[{{"mediaType":"application/vnd.oci.image.manifest.v1+json","digest":"{}","size":{},"annotations":{{"org.opencontainers.image.ref.name":"{}"}}}}]}}"#,
        manifest_digest(),
        manifest.len(),
        tag
    );
    fs::write(root.join("index.json"), index).unwrap();
}
