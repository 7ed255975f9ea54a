use assert_cmd::Command;
use predicates::prelude::*;

fn console() -> Command {
    let mut cmd = Command::cargo_bin("foodshare-console").unwrap();
    cmd.env_remove("FOODSHARE_CONFIG")
        .env_remove("FOODSHARE_MASTER_ADDR")
        .env_remove("FOODSHARE_USER")
        .env_remove("FOODSHARE_PASSWORD");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    console()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("customer"))
        .stdout(predicate::str::contains("manager"))
        .stdout(predicate::str::contains("send"));
}

#[test]
fn test_customer_help_shows_location() {
    console()
        .args(["customer", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--lat"))
        .stdout(predicate::str::contains("--radius"));
}

#[test]
fn test_send_rejects_unknown_command() {
    console()
        .args(["send", "TELEPORT", "anywhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command 'TELEPORT'"));
}

#[test]
fn test_send_without_master_fails() {
    console()
        .args(["--master", "127.0.0.1:1", "send", "LIST_STORES"])
        .assert()
        .failure();
}

#[test]
fn test_manager_menu_reads_piped_answers_in_order() {
    console()
        .args(["--master", "127.0.0.1:1", "manager"])
        .write_stdin("8\n10\n")
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| out.matches("Foodshare - Manager").count() == 2))
        .stdout(predicate::str::contains("Goodbye!"));
}
