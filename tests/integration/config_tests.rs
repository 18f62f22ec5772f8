use clap::Parser;
use dupefind::cli::{Cli, Commands, ScanArgs};
use dupefind::config::Config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::{Figment, Jail};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn scan_args(argv: &[&str]) -> ScanArgs {
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Scan(args) => args,
    }
}

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 4);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
io_threads = 8
buffer_size = 65536
follow_symlinks = true
ignore_patterns = ["*.bak", "target/"]
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.io_threads, 8);
    assert_eq!(config.buffer_size, 65_536);
    assert!(config.follow_symlinks);
    assert!(!config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.bak", "target/"]);
}

#[test]
fn test_config_env_layer() {
    Jail::expect_with(|jail| {
        jail.set_env("DUPEFIND_SKIP_HIDDEN", "true");
        jail.set_env("DUPEFIND_BUFFER_SIZE", "4096");

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("DUPEFIND_"));
        let config: Config = figment.extract()?;

        assert!(config.skip_hidden);
        assert_eq!(config.buffer_size, 4096);
        Ok(())
    });
}

#[test]
fn test_cli_flags_override_file_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "layers.toml",
            "io_threads = 2\nbuffer_size = 1024\nignore_patterns = [\"*.log\"]",
        )?;
        jail.set_env("DUPEFIND_IO_THREADS", "6");

        let mut config =
            Config::load(Some(Path::new("layers.toml"))).map_err(|e| e.to_string())?;
        assert_eq!(config.io_threads, 6);

        let args = scan_args(&[
            "dupefind",
            "scan",
            "/data",
            "--io-threads",
            "1",
            "--skip-hidden",
            "--ignore",
            "*.tmp",
        ]);
        config.apply_scan_args(&args);

        assert_eq!(config.io_threads, 1);
        assert_eq!(config.buffer_size, 1024);
        assert!(config.skip_hidden);
        assert_eq!(config.ignore_patterns, vec!["*.log", "*.tmp"]);
        Ok(())
    });
}

#[test]
fn test_absent_flags_keep_lower_layers() {
    let mut config = Config {
        io_threads: 3,
        follow_symlinks: true,
        ..Config::default()
    };
    config.apply_scan_args(&scan_args(&["dupefind", "scan", "/data"]));

    assert_eq!(config.io_threads, 3);
    assert!(config.follow_symlinks);
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = [").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}
