use assert_cmd::Command;

fn locallib() -> Command {
    let mut cmd = Command::cargo_bin("locallib-cli").unwrap();
    cmd.env("LOCALLIB_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .env_remove("LOCALLIB_ENV");
    cmd
}

#[test]
fn config_prints_effective_settings() {
    let output = locallib()
        .arg("config")
        .env("LOCALLIB_SERVER__PORT", "4100")
        .output()
        .unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["server"]["port"], 4100);
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["database"]["name"], "local_library");
}

#[test]
fn unknown_environment_fails() {
    locallib()
        .arg("config")
        .env("LOCALLIB_ENV", "moon")
        .assert()
        .failure();
}

#[test]
fn help_lists_subcommands() {
    let output = locallib().arg("--help").output().unwrap();
    let help = String::from_utf8(output.stdout).unwrap();
    assert!(help.contains("serve"));
    assert!(help.contains("config"));
}
