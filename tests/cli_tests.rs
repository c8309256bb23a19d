use assert_cmd::Command;
use budget_engine::config::paths::{EnginePaths, DATA_DIR_ENV};
use budget_engine::models::{
    AccountBookId, Budget, CategoryId, Cycle, Money, RolloverPolicy, Transaction,
};
use budget_engine::storage::{BudgetStore, Storage};
use chrono::{NaiveDate, TimeZone, Utc};
use predicates::prelude::*;
use tempfile::TempDir;

fn engine_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("budget-engine").unwrap();
    cmd.env(DATA_DIR_ENV, dir.path()).env_remove("RUST_LOG");
    cmd
}

fn spend(book: AccountBookId, y: i32, m: u32, d: u32, units: i64) -> Transaction {
    Transaction::new(
        book,
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        Money::from_units(-units),
    )
}

/// A carry-unspent household budget with $600 spent in January and $1300 in February
fn seed_household(dir: &TempDir) -> AccountBookId {
    let storage = Storage::new(EnginePaths::with_base_dir(dir.path().to_path_buf())).unwrap();
    let book = AccountBookId::new();
    let budget = Budget::new(
        "Household",
        book,
        Money::from_units(1000),
        Cycle::monthly(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
    )
    .with_rollover(RolloverPolicy::CarryUnspent);
    storage.budgets.upsert(budget).unwrap();

    for txn in [
        spend(book, 2025, 1, 10, 600),
        spend(book, 2025, 2, 3, 1000),
        spend(book, 2025, 2, 20, 300),
    ] {
        storage.ledger.insert(txn).unwrap();
    }
    storage.save_all().unwrap();
    book
}

#[test]
fn test_no_command_prints_hint() {
    let dir = TempDir::new().unwrap();
    engine_cmd(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("budget-engine --help"));
}

#[test]
fn test_config_shows_paths() {
    let dir = TempDir::new().unwrap();
    engine_cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Base directory:"))
        .stdout(predicate::str::contains("Cache enabled:  true"));
}

#[test]
fn test_init_writes_settings() {
    let dir = TempDir::new().unwrap();
    engine_cmd(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized budget-engine"));
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn test_budget_create_and_list() {
    let dir = TempDir::new().unwrap();
    let book = AccountBookId::new().as_uuid().to_string();

    engine_cmd(&dir)
        .args([
            "budget", "create", "Groceries", "450", "--book", &book, "--anchor", "2025-01-01",
            "--cycle", "weekly", "--rollover", "carry-deficit",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created budget: Groceries"));

    engine_cmd(&dir)
        .args(["budget", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("$450.00"));
}

#[test]
fn test_budget_create_rejects_bad_cycle() {
    let dir = TempDir::new().unwrap();
    let book = AccountBookId::new().as_uuid().to_string();

    engine_cmd(&dir)
        .args([
            "budget", "create", "Groceries", "450", "--book", &book, "--anchor", "2025-01-01",
            "--cycle", "fortnightly",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown cycle length"));
}

#[test]
fn test_budget_periods() {
    let dir = TempDir::new().unwrap();
    seed_household(&dir);

    engine_cmd(&dir)
        .args(["budget", "periods", "Household", "--to", "2025-03-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-01"))
        .stdout(predicate::str::contains("2025-02-01"))
        .stdout(predicate::str::contains("2025-03-01"));
}

#[test]
fn test_usage_carries_unspent_amount() {
    let dir = TempDir::new().unwrap();
    seed_household(&dir);

    engine_cmd(&dir)
        .args(["usage", "household", "--date", "2025-02-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Carried:   $400.00"))
        .stdout(predicate::str::contains(
            "Spent: $1300.00 of $1400.00 | Remaining: $100.00 | 92.86%",
        ))
        .stdout(predicate::str::contains("Overspent").not());
}

#[test]
fn test_usage_json_by_index() {
    let dir = TempDir::new().unwrap();
    seed_household(&dir);

    let output = engine_cmd(&dir)
        .args(["usage", "Household", "--index", "0", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"]["spent"], 60000);
    assert_eq!(report["total"]["remaining"], 40000);
    assert_eq!(report["total"]["carried_amount"], 0);
    assert_eq!(report["total"]["is_overspent"], false);
}

#[test]
fn test_usage_with_category_allocation() {
    let dir = TempDir::new().unwrap();
    let book = seed_household(&dir);
    let category = CategoryId::new();

    let mut storage = Storage::new(EnginePaths::with_base_dir(dir.path().to_path_buf())).unwrap();
    storage.load_all().unwrap();
    storage
        .ledger
        .insert(spend(book, 2025, 1, 15, 120).with_category(category))
        .unwrap();
    storage.save_all().unwrap();

    engine_cmd(&dir)
        .args([
            "budget",
            "allocate",
            "Household",
            &category.as_uuid().to_string(),
            "100",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Allocated $100.00"));

    engine_cmd(&dir)
        .args(["usage", "Household", "--date", "2025-01-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category"))
        .stdout(predicate::str::contains("OVER"));
}

#[test]
fn test_usage_unknown_budget_fails() {
    let dir = TempDir::new().unwrap();
    seed_household(&dir);

    engine_cmd(&dir)
        .args(["usage", "Vacation"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Budget not found: Vacation"));
}

#[test]
fn test_usage_before_anchor_fails() {
    let dir = TempDir::new().unwrap();
    seed_household(&dir);

    engine_cmd(&dir)
        .args(["usage", "Household", "--date", "2024-12-31"])
        .assert()
        .failure();
}

#[test]
fn test_stats_json_totals() {
    let dir = TempDir::new().unwrap();
    let book = seed_household(&dir).as_uuid().to_string();

    let output = engine_cmd(&dir)
        .args([
            "stats", "--book", &book, "--start", "2025-02-01", "--end", "2025-03-01", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["totals"]["expense"], -130000);
    assert_eq!(snapshot["totals"]["income"], 0);
    assert_eq!(snapshot["totals"]["transaction_count"], 2);
}

#[test]
fn test_stats_by_day_table() {
    let dir = TempDir::new().unwrap();
    let book = seed_household(&dir).as_uuid().to_string();

    engine_cmd(&dir)
        .args([
            "stats", "--book", &book, "--start", "2025-01-01", "--end", "2025-03-01", "--by",
            "day",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Expense:"))
        .stdout(predicate::str::contains("2025-02-20"));
}

#[test]
fn test_stats_rejects_inverted_window() {
    let dir = TempDir::new().unwrap();
    let book = seed_household(&dir).as_uuid().to_string();

    engine_cmd(&dir)
        .args(["stats", "--book", &book, "--start", "2025-03-01", "--end", "2025-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_stats_requires_book() {
    let dir = TempDir::new().unwrap();

    engine_cmd(&dir)
        .args(["stats", "--start", "2025-01-01", "--end", "2025-02-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No account book given"));
}
