use nodeci::gitlab::{self, GitlabCi, Job};

#[test]
fn document_lists_install_build_test() {
    let yaml = gitlab::pipeline().to_yaml().unwrap();
    let doc: serde_yml::Value = serde_yml::from_str(&yaml).unwrap();

    assert_eq!(doc["image"].as_str(), Some("node:latest"));
    assert_eq!(doc["npm_install"]["script"][0].as_str(), Some("npm install"));
    assert_eq!(doc["npm_build"]["script"][0].as_str(), Some("npm run build"));
    assert_eq!(doc["npm_test"]["script"][0].as_str(), Some("npm run test"));
    assert!(doc.get("yarn_install").is_none());
}

#[test]
fn yarn_install_can_be_added() {
    let ci = gitlab::pipeline().add_job("yarn_install", gitlab::yarn_install());
    assert_eq!(
        ci.job_names(),
        vec!["npm_install", "npm_build", "npm_test", "yarn_install"]
    );
    assert_eq!(ci.job("yarn_install").unwrap().script, vec!["yarn install"]);
}

#[test]
fn custom_document_omits_unset_image_and_cache() {
    let ci = GitlabCi::new().add_job("lint", Job::new().script("npm ci").script("npm run lint"));
    let yaml = ci.to_yaml().unwrap();
    let doc: serde_yml::Value = serde_yml::from_str(&yaml).unwrap();

    assert_eq!(doc["lint"]["script"][1].as_str(), Some("npm run lint"));
    assert!(doc.get("image").is_none());
    assert!(doc.get("cache").is_none());
}

#[test]
fn write_overwrites_existing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(".gitlab-ci.yml");
    std::fs::write(&path, "stale").unwrap();

    gitlab::pipeline().write(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("stale"));
    assert!(content.contains("node_modules/"));
}
