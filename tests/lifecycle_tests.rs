use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const HEADER: &str = "event, loan, client, collateral, amount, kind, method, reference, date";

#[test]
fn test_full_repayment_completes_loan() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "open, 1, 100, 7, 30000, , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "approve, 1, , , , , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "pay, 1, , , 9000, interest, cash, , 2026-01-08T00:00:00Z").unwrap();
    writeln!(file, "pay, 1, , , 30000, principal, cash, , 2026-01-10T00:00:00Z").unwrap();

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path());

    cmd.assert().success().stdout(predicate::str::contains(
        "1,completed,30000,0,30000,9000,9000,0,2026-01-19T00:00:00",
    ));
}

#[test]
fn test_rejected_application_is_never_disbursed() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "open, 1, 100, , 5000, , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "reject, 1, , , , , , , 2026-01-06T00:00:00Z").unwrap();

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,rejected,5000,5000,0,0,0,"));
}

#[test]
fn test_claim_writes_off_overdue_loan() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "open, 1, 100, 7, 2000, , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "approve, 1, , , , , , , 2026-01-05T00:00:00Z").unwrap();
    // a day past the first due date, nothing paid
    writeln!(file, "claim, 1, , , , , , , 2026-01-13T00:00:00Z").unwrap();

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,claimed,2000,0,0,0,0,0,"));
}

#[test]
fn test_claim_before_due_date_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(file, "open, 1, 100, 7, 2000, , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "approve, 1, , , , , , , 2026-01-05T00:00:00Z").unwrap();
    writeln!(file, "claim, 1, , , , , , , 2026-01-10T00:00:00Z").unwrap();

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("not past its due date"))
        .stdout(predicate::str::contains("1,active,2000,2000,0,0,0,2600.00,"));
}
