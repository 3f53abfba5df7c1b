use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    let Some(manifest_dir) = std::env::var_os("CARGO_MANIFEST_DIR") else {
        return;
    };
    let Ok(repo) = gix::discover(Path::new(&manifest_dir)) else {
        return;
    };

    // Rebuild when HEAD moves or a branch is updated.
    let git_dir = repo.git_dir();
    for watched in ["HEAD", "refs", "packed-refs"] {
        let path = git_dir.join(watched);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }

    if let Ok(id) = repo.head_id() {
        println!("cargo:rustc-env=SCRIBE_BUILD_HEAD={}", id.to_hex_with_len(7));
    }
}
