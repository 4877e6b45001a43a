use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const HEADER: &str = "event, loan, client, collateral, amount, kind, method, reference, date";

fn approved_loan_csv(principal: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    writeln!(
        file,
        "open, 1, 100, 7, {principal}, , , , 2026-01-05T00:00:00Z"
    )
    .unwrap();
    writeln!(file, "approve, 1, , , , , , , 2026-01-05T00:00:00Z").unwrap();
    file
}

#[test]
fn test_unpaid_periods_compound_into_principal() {
    let file = approved_loan_csv("10000");

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path()).arg("--as-of").arg("2026-01-19T00:00:00Z");

    // two closed periods: 10000 * 1.3 * 1.3, next period's interest on top
    cmd.assert().success().stdout(predicate::str::contains(
        "1,active,10000,16900.00,0,0,0,21970.00,2026-01-26T00:00:00",
    ));
}

#[test]
fn test_compounding_applies_once_per_period() {
    let file = approved_loan_csv("10000");

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path()).arg("--as-of").arg("2026-02-04T00:00:00Z");

    // day 30: four periods closed, 10000 * 1.3^4
    cmd.assert().success().stdout(predicate::str::contains(
        "1,active,10000,28561.00,0,0,0,",
    ));
}

#[test]
fn test_loan_untouched_within_period_does_not_accrue() {
    let file = approved_loan_csv("30000");

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    cmd.arg(file.path()).arg("--as-of").arg("2026-01-11T00:00:00Z");

    cmd.assert().success().stdout(predicate::str::contains(
        "1,active,30000,30000,0,0,0,39000.00,2026-01-12T00:00:00",
    ));
}

#[test]
fn test_interest_paid_early_defers_the_next_period() {
    let mut file = approved_loan_csv("30000");
    writeln!(file, "pay, 1, , , 9000, interest, mpesa, NLJ7RT61SV, 2026-01-08T00:00:00Z").unwrap();

    let mut cmd = Command::new(cargo_bin!("mifugo"));
    // the covered period closes at day 14 without compounding
    cmd.arg(file.path()).arg("--as-of").arg("2026-01-19T00:00:00Z");

    cmd.assert().success().stdout(predicate::str::contains(
        "1,active,30000,30000,0,9000,0,39000.00,2026-01-26T00:00:00",
    ));
}
