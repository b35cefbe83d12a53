mod common;

use assert_cmd::Command;
use predicates::str::contains;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("credit_tracker_cli").unwrap();
    cmd.env("CREDIT_TRACKER_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands_without_touching_disk() {
    let home = common::temp_home();
    cli(&home)
        .arg("help")
        .assert()
        .success()
        .stdout(contains("Available commands"))
        .stdout(contains("end-payment"));
    assert!(!home.join("ledger.json").exists());
}

#[test]
fn players_balances_and_forecast_round_trip() {
    let home = common::temp_home();

    cli(&home)
        .args(["add-player", "Ripley", "500"])
        .assert()
        .success()
        .stdout(contains("Added Ripley"));
    assert!(home.join("ledger.json").exists());

    cli(&home)
        .args(["pay", "ripley", "Docking", "100", "1w"])
        .assert()
        .success()
        .stdout(contains("100cr/week"));

    cli(&home)
        .args(["balance", "Ripley"])
        .assert()
        .success()
        .stdout(contains("Ripley: 400cr"));

    cli(&home)
        .args(["forecast", "Ripley"])
        .assert()
        .success()
        .stdout(contains("runs out in 35 days"));

    cli(&home)
        .args(["players", "--json"])
        .assert()
        .success()
        .stdout(contains("\"days_to_insolvency\": 35"));
}

#[test]
fn clock_commands_move_the_simulation() {
    let home = common::temp_home();
    cli(&home).args(["add-player", "Hicks", "1000"]).assert().success();
    cli(&home)
        .args(["pay", "Hicks", "Rations", "10", "1d"])
        .assert()
        .success();

    cli(&home)
        .args(["advance", "3d"])
        .assert()
        .success()
        .stdout(contains("Clock advanced"));
    cli(&home)
        .args(["balance", "Hicks"])
        .assert()
        .success()
        .stdout(contains("Hicks: 960cr"));

    cli(&home).arg("reset").assert().success();
    cli(&home)
        .args(["balance", "Hicks"])
        .assert()
        .success()
        .stdout(contains("Hicks: 990cr"));
}

#[test]
fn unknown_inputs_fail_with_a_message() {
    let home = common::temp_home();
    cli(&home)
        .arg("launch")
        .assert()
        .failure()
        .stderr(contains("unknown command"));
    cli(&home)
        .args(["balance", "Nobody"])
        .assert()
        .failure()
        .stderr(contains("Unknown player: Nobody"));
    cli(&home)
        .args(["pay", "Nobody", "Rent", "10", "0d"])
        .assert()
        .failure();
}

#[test]
fn ending_an_unknown_payment_is_a_warning_not_a_failure() {
    let home = common::temp_home();
    cli(&home)
        .args(["end-payment", "deadbeef"])
        .assert()
        .success()
        .stdout(contains("No scheduled payment matches"));
}

#[test]
fn config_changes_are_saved_and_applied() {
    let home = common::temp_home();
    cli(&home)
        .args(["config", "history_days", "7"])
        .assert()
        .success()
        .stdout(contains("Saved history_days = 7"));
    assert!(home.join("config").join("config.json").exists());

    cli(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(contains("history_days"))
        .stdout(contains("7"));
    cli(&home)
        .args(["config", "warp_factor", "9"])
        .assert()
        .failure()
        .stderr(contains("Unknown setting `warp_factor`"));
}

#[test]
fn pay_all_splits_across_players() {
    let home = common::temp_home();
    cli(&home).args(["add-player", "Apone", "100"]).assert().success();
    cli(&home).args(["add-player", "Drake", "100"]).assert().success();

    cli(&home)
        .args(["pay-all", "Dropship", "15", "1w"])
        .assert()
        .success()
        .stdout(contains("8cr"))
        .stdout(contains("7cr"));
    cli(&home)
        .args(["balance", "Drake"])
        .assert()
        .success()
        .stdout(contains("Drake: 93cr"));
}
