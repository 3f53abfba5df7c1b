/// Short id of the git HEAD this binary was built from, or the crate version
/// when it was built outside a repository. Fixed at compile time.
pub fn fingerprint() -> String {
    option_env!("SCRIBE_BUILD_HEAD")
        .unwrap_or(env!("CARGO_PKG_VERSION"))
        .to_string()
}
