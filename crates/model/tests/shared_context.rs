use cropcast_model::{shared_context, ArtifactPaths, StartupPolicy};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn shared_context_loads_once() {
    let first_dir = TempDir::new().expect("tempdir");
    std::fs::write(first_dir.path().join("yield_df.csv"), "Area,Item\nIndia,Rice\n")
        .expect("write dataset");
    let second_dir = TempDir::new().expect("tempdir");

    let first = shared_context(
        &ArtifactPaths::from_model_dir(first_dir.path()),
        StartupPolicy::Degraded,
    )
    .expect("first init");
    let second = shared_context(
        &ArtifactPaths::from_model_dir(second_dir.path()),
        StartupPolicy::Strict,
    )
    .expect("second call reuses the first context");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.options().regions, vec!["India"]);
}
