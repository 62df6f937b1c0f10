pub fn version_label() -> String {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DIRTY: &str = env!("GIT_DIRTY");
    #[allow(clippy::const_is_empty)]
    if GIT_HASH.is_empty() {
        format!("Version {VERSION}")
    } else {
        let is_dirty = GIT_DIRTY == "true";
        format!(
            "Version {VERSION} ({GIT_HASH}{})",
            if is_dirty { " DIRTY" } else { "" }
        )
    }
}

#[test]
fn test_version_label() {
    let label = version_label();
    assert!(label.starts_with("Version "));
    assert!(label.contains(env!("CARGO_PKG_VERSION")));
}
