use assert_cmd::Command;
use predicates::prelude::*;

fn aromix() -> Command {
    Command::cargo_bin("aromix_cli").expect("binary builds")
}

#[test]
fn help_lists_the_subcommands() {
    aromix()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("recipes"))
        .stdout(predicate::str::contains("self-check"));
}

#[test]
fn self_check_reports_ok() {
    aromix()
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check ok"));
}

#[test]
fn recipes_lists_the_predefined_catalog() {
    aromix()
        .arg("recipes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Coffee"))
        .stdout(predicate::str::contains("Lavender"))
        .stdout(predicate::str::contains("0x06"));
}

#[test]
fn bounded_run_with_a_demo_command_prints_status_json() {
    aromix()
        .args([
            "--json",
            "run",
            "--iterations",
            "3",
            "--direct",
            "--demo",
            "coffee",
            "--intensity",
            "50",
            "--duration-s",
            "2",
            "--status-json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("communication_active"))
        .stdout(predicate::str::contains("\"state\":\"Running\""));
}

#[test]
fn unknown_demo_odor_fails_with_a_diagnostic() {
    aromix()
        .args(["run", "--iterations", "1", "--demo", "petrichor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("petrichor"));
}

#[test]
fn queued_run_exits_after_bounded_iterations() {
    aromix()
        .args(["run", "--iterations", "5", "--demo", "mint"])
        .assert()
        .success();
}

#[test]
fn custom_recipes_from_config_show_up_in_the_listing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let recipe_path = dir.path().join("custom_recipes.toml");
    aromix_config::save_recipes(
        &recipe_path,
        &[aromix_config::RecipeRow {
            odor_id: 0x07,
            name: "Petrichor".into(),
            pump_ratios: [10, 10, 10, 10, 10],
            valve_states: [true, true, true, true, true],
            mixing_time_ms: 900,
            fan_speed: 30,
        }],
    )
    .expect("seed recipes");

    let config_path = dir.path().join("aromix.toml");
    std::fs::write(
        &config_path,
        format!("[recipes]\npath = \"{}\"\n", recipe_path.display()),
    )
    .expect("write config");

    aromix()
        .args(["--config", config_path.to_str().unwrap(), "recipes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Petrichor"))
        .stdout(predicate::str::contains("0x07"));
}

#[test]
fn invalid_config_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("aromix.toml");
    std::fs::write(&config_path, "[limits]\nmax_intensity = 250\n").expect("write config");

    aromix()
        .args(["--config", config_path.to_str().unwrap(), "recipes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_intensity"));
}
