use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const SCENARIO: &str = "\
# March 2025, today is the 15th
store add Central
product add Central Bread 1000
plan add Central Regular Bread=40
budget set Central 2025-03 300000
schedule assign Central Regular 2025-03-03
schedule assign Central Regular 2025-03-05
schedule assign Central Regular 2025-03-20
schedule actual Central 2025-03-03 50000
schedule actual Central 2025-03-05 70000
";

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("budget_forecast_cli").unwrap();
    cmd.env("BUDGET_FORECAST_HOME", home.path())
        .env("BUDGET_FORECAST_TODAY", "2025-03-15")
        .env("BUDGET_FORECAST_CLI_SCRIPT", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_reports_forecast_as_json() {
    let home = TempDir::new().unwrap();
    let input = format!("{SCENARIO}forecast Central 2025-03 --json\nexit\n");

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("\"forecast_amount\": 160000"))
        .stdout(contains("\"forecast_achievement_rate\": \"53.3\""))
        .stdout(contains("\"daily_required\": 8235"));

    assert!(home.path().join("data").join("planning.db").exists());
}

#[test]
fn second_assignment_on_same_day_reports_conflict() {
    let home = TempDir::new().unwrap();
    let input = format!("{SCENARIO}schedule assign Central Regular 2025-03-20\nexit\n");

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("ERROR: Conflict: 2025-03-20 is already occupied"));
}

#[test]
fn largest_budget_still_forecasts() {
    let home = TempDir::new().unwrap();
    let input = format!(
        "{SCENARIO}budget set Central 2025-03 2305843009213693951\n\
         forecast Central 2025-03 --json\n\
         report Central 2025-03\n\
         exit\n"
    );

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("\"target_amount\": 2305843009213693951"))
        .stdout(contains("\"required_additional\": 2305843009213533951"))
        .stdout(contains("=== Report Central 2025-03 ==="))
        .stderr(contains("panicked").not());
}

#[test]
fn state_persists_between_runs() {
    let home = TempDir::new().unwrap();
    cli(&home).write_stdin(SCENARIO).assert().success();

    cli(&home)
        .write_stdin("report Central 2025-03\n")
        .assert()
        .success()
        .stdout(contains("=== Report Central 2025-03 ==="))
        .stdout(contains("120,000"));
}

#[test]
fn unknown_command_suggests_closest_match() {
    let home = TempDir::new().unwrap();

    cli(&home)
        .write_stdin("forcast Central 2025-03\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `forcast`"))
        .stdout(contains("Suggestion: `forecast`?"));
}

#[test]
fn invalid_month_prints_error_and_keeps_running() {
    let home = TempDir::new().unwrap();

    cli(&home)
        .write_stdin("store add Central\ncalendar Central 2025-13\nversion\n")
        .assert()
        .success()
        .stdout(contains("ERROR:"))
        .stdout(contains("Budget Forecast").and(contains("CLI version")));
}
