#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

const HEADER: &str = "event, loan, client, collateral, amount, kind, method, reference, date";

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: open and approve a loan
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "{HEADER}").unwrap();
    writeln!(csv1, "open, 1, 100, 7, 30000, , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(csv1, "approve, 1, , , , , , , 2026-01-05T00:00:00Z").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("mifugo"));
    cmd1.arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,active,30000,30000,0,0,0,39000.00,2026-01-12T00:00:00"));

    // 2. Second run: pay the period's interest using the same DB path
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "{HEADER}").unwrap();
    writeln!(csv2, "pay, 1, , , 9000, interest, cash, , 2026-01-08T00:00:00Z").unwrap();

    let mut cmd2 = Command::new(cargo_bin!("mifugo"));
    cmd2.arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // Recovered loan state absorbed the payment and advanced the due date
    assert!(stdout2.contains("1,active,30000,30000,0,9000,9000,30000,2026-01-19T00:00:00"));
}
