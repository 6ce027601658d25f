use super::*;
use crate::model::DEFAULT_PROVIDER;
use serde_json::json;
use std::time::Duration;

const EXAMPLE: &str = r#"
project "demo"

provider "linode" {
    url "https://api.linode.com/v4"
}

sshkey "deploy" { label "deploy"; ssh_key "ssh-ed25519 AAAA deploy@example" }

instance "web" {
    label "web-1"
    region "us-west"
    type "g6-nanode-1"
    image "linode/debian12"
    authorized_keys "ssh-ed25519 AAAA deploy@example"
}

volume "data" {
    label "v1"
    region "us-west"
    size 20
    linode_id ref="instance.web"
}

image "golden" {
    label "golden"
    disk_id 100
    linode_id 200
    timeouts {
        create 1200
        delete "5m"
    }
}
"#;

#[test]
fn test_parse_example_manifest() {
    let manifest = parse_manifest_str(EXAMPLE, "fallback".to_string()).unwrap();

    assert_eq!(manifest.name, "demo");
    assert_eq!(
        manifest.provider("linode").unwrap().url.as_deref(),
        Some("https://api.linode.com/v4")
    );
    assert_eq!(manifest.resources.len(), 4);

    let sshkey = manifest.resource("sshkey", "deploy").unwrap();
    assert_eq!(sshkey.provider, DEFAULT_PROVIDER);
    assert_eq!(sshkey.attribute("label"), Some(&json!("deploy")));

    let instance = manifest.resource("instance", "web").unwrap();
    assert_eq!(
        instance.attribute("authorized_keys"),
        Some(&json!(["ssh-ed25519 AAAA deploy@example"]))
    );

    let volume = manifest.resource("volume", "data").unwrap();
    assert_eq!(volume.attribute("size"), Some(&json!(20)));
    assert!(volume.attribute("linode_id").is_none());
    assert_eq!(volume.references["linode_id"], "instance:web");
}

#[test]
fn test_parse_timeouts() {
    let manifest = parse_manifest_str(EXAMPLE, "demo".to_string()).unwrap();
    let image = manifest.resource("image", "golden").unwrap();

    assert_eq!(image.timeouts.create, Duration::from_secs(1200));
    assert_eq!(image.timeouts.delete, Duration::from_secs(300));
    assert_eq!(image.timeouts.update, linodeflow_cloud::Timeouts::default().update);
}

#[test]
fn test_to_resource_set() {
    let manifest = parse_manifest_str(EXAMPLE, "demo".to_string()).unwrap();
    let set = manifest.to_resource_set();

    assert_eq!(set.len(), 4);
    let volume = set.get("volume", "data").unwrap();
    assert_eq!(volume.provider, "linode");
    assert_eq!(volume.references["linode_id"], "instance:web");
    assert_eq!(volume.get_config::<String>("region").as_deref(), Some("us-west"));
}

#[test]
fn test_project_name_defaults() {
    let manifest = parse_manifest_str(r#"sshkey "k" { label "k"; ssh_key "ssh-rsa AAAA" }"#, "fallback".to_string()).unwrap();
    assert_eq!(manifest.name, "fallback");
}

#[test]
fn test_unknown_node_is_rejected() {
    let err = parse_manifest_str(r#"bucket "b" {}"#, "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::UnknownNode(ref n) if n == "bucket"));
}

#[test]
fn test_duplicate_resource_is_rejected() {
    let kdl = r#"
        volume "data" { label "a"; region "us-west" }
        volume "data" { label "b"; region "us-west" }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::Duplicate(_)));
}

#[test]
fn test_reference_to_undeclared_resource() {
    let kdl = r#"
        volume "data" { label "a"; region "us-west"; linode_id ref="instance.missing" }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidReference { ref target, .. } if target == "instance:missing"));
}

#[test]
fn test_malformed_reference() {
    let kdl = r#"
        volume "data" { label "a"; region "us-west"; linode_id ref="web" }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidReference { ref reason, .. } if reason.contains("TYPE.NAME")));
}

#[test]
fn test_value_and_reference_conflict() {
    let kdl = r#"
        instance "web" { label "w"; region "us-west"; type "g6-nanode-1" }
        volume "data" { label "a"; region "us-west"; linode_id 5 ref="instance.web" }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(err.to_string().contains("both a value and a ref"));
}

#[test]
fn test_undeclared_provider() {
    let kdl = r#"
        sshkey "k" { provider "other"; label "k"; ssh_key "ssh-rsa AAAA" }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::ProviderNotFound(ref p) if p == "other"));
}

#[test]
fn test_invalid_timeout() {
    let kdl = r#"
        volume "data" { label "a"; region "us-west"; timeouts { create "soon" } }
    "#;
    assert!(parse_manifest_str(kdl, "demo".to_string()).is_err());
}

#[test]
fn test_overflowing_timeout_is_rejected() {
    let kdl = r#"
        image "golden" {
            label "golden"; disk_id 100; linode_id 200
            timeouts { create "9999999999999999999h" }
        }
    "#;
    let err = parse_manifest_str(kdl, "demo".to_string()).unwrap_err();
    assert!(
        matches!(err, ManifestError::InvalidConfig(ref m) if m.contains("timeout 'create'")),
        "{}",
        err
    );
}

#[test]
fn test_invalid_kdl() {
    let err = parse_manifest_str("volume \"data\" {", "demo".to_string()).unwrap_err();
    assert!(matches!(err, ManifestError::KdlParse(_)));
}

#[test]
fn test_parse_manifest_file_uses_directory_name() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("shop");
    std::fs::create_dir(&project).unwrap();
    let path = project.join("linode.kdl");
    std::fs::write(&path, r#"sshkey "k" { label "k"; ssh_key "ssh-rsa AAAA" }"#).unwrap();

    let manifest = parse_manifest_file(&path).unwrap();
    assert_eq!(manifest.name, "shop");
}

#[test]
fn test_parse_manifest_file_missing() {
    let err = parse_manifest_file("/nonexistent/linode.kdl").unwrap_err();
    assert!(matches!(err, ManifestError::IoError { .. }));
}
