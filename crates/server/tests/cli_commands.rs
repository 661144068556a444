use assert_cmd::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_model_dir(dir: &Path) {
    std::fs::write(
        dir.join("yield_df.csv"),
        "Area,Item,Year\nAlbania,Maize,1990\nIndia,Rice,1991\n",
    )
    .expect("write dataset");
    std::fs::write(dir.join("scaler.json"), r#"{"kind":"identity"}"#).expect("write scaler");
    std::fs::write(
        dir.join("model.json"),
        r#"{"kind":"linear","coefficients":[10.0,100.0,0.0,0.5,1.0,2.0],"intercept":5.0}"#,
    )
    .expect("write model");
}

#[test]
fn serve_refuses_non_loopback_without_public() {
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .env_remove("PORT")
        .args(["serve", "--bind", "0.0.0.0:0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Refusing to bind"));
}

#[test]
fn strict_serve_exits_when_artifacts_are_missing() {
    let temp = TempDir::new().expect("tempdir");
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .args(["--model-dir"])
        .arg(temp.path())
        .args(["serve", "--bind", "127.0.0.1:0", "--strict", "--ephemeral-users"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Model initialization failed"));
}

#[test]
fn doctor_reports_missing_artifacts() {
    let temp = TempDir::new().expect("tempdir");
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .env("CROPCAST_MODEL_DIR", temp.path())
        .args(["doctor", "--json"])
        .assert()
        .failure()
        .stdout(predicates::str::contains(r#""ready": false"#));
}

#[test]
fn doctor_succeeds_on_a_complete_model_dir() {
    let temp = TempDir::new().expect("tempdir");
    write_model_dir(temp.path());
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .args(["--model-dir"])
        .arg(temp.path())
        .args(["doctor", "--json"])
        .assert()
        .success()
        .stdout(predicates::str::contains(r#""regions": 2"#));
}

#[test]
fn predict_prints_the_estimate() {
    let temp = TempDir::new().expect("tempdir");
    write_model_dir(temp.path());
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .args(["--model-dir"])
        .arg(temp.path())
        .args([
            "predict",
            "--area",
            "India",
            "--item",
            "Rice",
            "--year",
            "2020",
            "--rainfall",
            "1200",
            "--pesticides",
            "50",
            "--temp",
            "22.5",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains(r#""prediction": 810.0"#));
}

#[test]
fn predict_rejects_unknown_area() {
    let temp = TempDir::new().expect("tempdir");
    write_model_dir(temp.path());
    Command::new(assert_cmd::cargo::cargo_bin!("cropcast"))
        .args(["--model-dir"])
        .arg(temp.path())
        .args([
            "predict",
            "--area",
            "Atlantis",
            "--item",
            "Rice",
            "--year",
            "2020",
            "--rainfall",
            "1200",
            "--pesticides",
            "50",
            "--temp",
            "22.5",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Unknown region: Atlantis"));
}
