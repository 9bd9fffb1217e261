use anyhow::Result;
use std::fs;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_plsql-analyzer");

/// Test that issues are printed as file:line:col with their secondary locations
#[test]
fn test_cli_reports_issues() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("dup.sql");
    fs::write(&path, "begin\n  if x = x then null; end if;\nend;\n/\n")?;

    let output = Command::new(BIN).arg(&path).output()?;
    assert!(output.status.success(), "CLI failed: {:?}", output);

    let stdout = String::from_utf8(output.stdout)?;
    let file = path.display().to_string();
    assert!(
        stdout.contains(&format!(
            "{}:2:6: BLOCKER [IdenticalExpression] Identical sub-expressions on both sides of operator \"=\".",
            file
        )),
        "unexpected output: {}",
        stdout
    );
    assert!(stdout.contains(&format!("    {}:2:10: Original", file)));
    Ok(())
}

/// Test that a file that does not parse makes the run fail without hiding other files
#[test]
fn test_cli_parse_failure() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let bad = temp_dir.path().join("bad.sql");
    let good = temp_dir.path().join("good.sql");
    fs::write(&bad, "begin x := ; end;")?;
    fs::write(&good, "x := y = null;")?;

    let output = Command::new(BIN)
        .args(["--threads", "2"])
        .arg(&bad)
        .arg(&good)
        .output()?;
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("bad.sql: error: syntax error"), "stderr: {}", stderr);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("[ComparisonWithNull]"), "stdout: {}", stdout);
    Ok(())
}

#[test]
fn test_cli_max_depth() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("deep.sql");
    fs::write(&path, format!("x := {}1{};", "(".repeat(20), ")".repeat(20)))?;

    let output = Command::new(BIN).args(["--max-depth", "16"]).arg(&path).output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("Nesting deeper than 16"));
    Ok(())
}

#[test]
fn test_cli_lists_checks() -> Result<()> {
    let output = Command::new(BIN).arg("--list-checks").output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let keys: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(keys, vec!["IdenticalExpression", "ComparisonWithNull"]);
    assert!(stdout.lines().all(|line| line.ends_with("[bug]")), "{}", stdout);
    Ok(())
}

#[test]
fn test_cli_missing_file() -> Result<()> {
    let output = Command::new(BIN).arg("/nonexistent/input.sql").output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("Failed to read"));
    Ok(())
}
