use bytesize::ByteSize;
use clap::Parser;
use dupefind::cli::Cli;
use dupefind::error::ExitCode;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> ExitCode {
    let cli = Cli::try_parse_from(args).unwrap();
    dupefind::run_app(cli).unwrap()
}

#[test]
fn test_text_report_written_to_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"hello").unwrap();
    fs::write(data.join("b.txt"), b"hello").unwrap();
    fs::write(data.join("c.txt"), b"world").unwrap();
    let report = dir.path().join("duplicates_report.txt");

    let code = run(&[
        "dupefind",
        "-q",
        "scan",
        data.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.starts_with(&"=".repeat(80)));
    assert!(text.contains("DUPLICATE FILES REPORT"));
    assert!(text.contains("Found 1 duplicate group(s) with 2 total files."));
    assert!(text.contains(&format!("  [1] {}", data.join("a.txt").display())));
    assert!(text.contains(&format!("  [2] {}", data.join("b.txt").display())));
    assert!(!text.contains("c.txt"));
    assert!(text.contains(&format!("Potential space savings: {}", ByteSize::b(5))));
}

#[test]
fn test_text_report_no_duplicates() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("only.txt"), b"alone").unwrap();
    let report = dir.path().join("report.txt");

    let code = run(&[
        "dupefind",
        "-q",
        "scan",
        data.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "No duplicate files found.\n"
    );
}

#[test]
fn test_json_report_written_to_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("x1.bin"), vec![9u8; 300]).unwrap();
    fs::write(data.join("x2.bin"), vec![9u8; 300]).unwrap();
    fs::write(data.join("x3.bin"), vec![9u8; 300]).unwrap();
    let report = dir.path().join("report.json");

    let code = run(&[
        "dupefind",
        "-q",
        "scan",
        data.to_str().unwrap(),
        "--output",
        "json",
        "--io-threads",
        "2",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let groups = json["duplicates"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["size"], 300);
    assert_eq!(groups[0]["wasted"], 600);
    assert_eq!(groups[0]["files"].as_array().unwrap().len(), 3);
    assert_eq!(json["summary"]["total_files"], 3);
    assert_eq!(json["summary"]["reclaimable_space"], 600);
    assert_eq!(json["summary"]["exit_code_name"], "DF000");
}

#[test]
fn test_report_to_unwritable_location_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"1").unwrap();
    let report = dir.path().join("missing_dir").join("report.txt");

    let cli = Cli::try_parse_from([
        "dupefind",
        "-q",
        "scan",
        dir.path().to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ])
    .unwrap();

    let err = dupefind::run_app(cli).unwrap_err();
    assert!(format!("{:#}", err).contains("Cannot create report file"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}
