//! Integration tests for the vdeck CLI: import, decorate, export.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const SAMPLE_VCF: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Jane Smith\r\nORG:Acme\r\nEND:VCARD\r\n";

/// Test environment with isolated config and state paths
struct TestEnv {
    temp_dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.temp_dir.path().join("state.json")
    }

    fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.toml")
    }

    fn cmd(&self) -> AssertCommand {
        let mut cmd = AssertCommand::cargo_bin("vdeck").unwrap();
        cmd.current_dir(self.temp_dir.path());
        cmd.args([
            "--config",
            self.config_path().to_str().unwrap(),
            "--state",
            self.state_path().to_str().unwrap(),
        ]);
        cmd
    }

    fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn import(&self, name: &str, content: &str) {
        let path = self.write_file(name, content);
        self.cmd()
            .args(["import", path.to_str().unwrap()])
            .assert()
            .success();
    }

    fn list_stdout(&self) -> String {
        let output = self.cmd().arg("list").output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    fn first_contact_id(&self) -> String {
        self.list_stdout()
            .lines()
            .next()
            .expect("working set is empty")
            .split('\t')
            .next()
            .unwrap()
            .to_string()
    }
}

// =============================================================================
// Import / list / export
// =============================================================================

#[test]
fn test_import_reports_contact_count() {
    let env = TestEnv::new();
    let path = env.write_file("contacts.vcf", SAMPLE_VCF);
    env.cmd()
        .args(["import", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 contacts"));
}

#[test]
fn test_list_shows_name_and_org() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);
    let listing = env.list_stdout();
    assert!(listing.contains("Jane Smith\tAcme"));
}

#[test]
fn test_import_appends_unless_replace() {
    let env = TestEnv::new();
    env.import("a.vcf", SAMPLE_VCF);
    env.import("b.vcf", "BEGIN:VCARD\nFN:Bob\nEND:VCARD");
    assert_eq!(env.list_stdout().lines().count(), 2);

    let path = env.write_file("c.vcf", "BEGIN:VCARD\nFN:Carol\nEND:VCARD");
    env.cmd()
        .args(["import", "--replace", path.to_str().unwrap()])
        .assert()
        .success();
    let listing = env.list_stdout();
    assert_eq!(listing.lines().count(), 1);
    assert!(listing.contains("Carol"));
}

#[test]
fn test_import_decodes_quoted_printable_v21() {
    let env = TestEnv::new();
    env.import(
        "legacy.vcf",
        concat!(
            "BEGIN:VCARD\r\n",
            "VERSION:2.1\r\n",
            "FN;CHARSET=UTF-8;ENCODING=QUOTED-PRINTABLE:=EC=95=88=EB=85=95\r\n",
            "END:VCARD\r\n"
        ),
    );
    assert!(env.list_stdout().contains("안녕"));
}

#[test]
fn test_import_malformed_block_does_not_abort_batch() {
    let env = TestEnv::new();
    env.import(
        "mixed.vcf",
        "BEGIN VCARD\nFN Broken\nEND VCARD\nBEGIN:VCARD\nFN:Good One\nEND:VCARD",
    );
    let listing = env.list_stdout();
    assert_eq!(listing.lines().count(), 1);
    assert!(listing.contains("Good One"));
}

#[test]
fn test_export_round_trips_managed_fields() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);
    env.cmd()
        .args(["export", "-o", "out.vcf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 contacts"));

    let exported = fs::read_to_string(env.temp_dir.path().join("out.vcf")).unwrap();
    assert!(exported.contains("FN:Jane Smith"));
    assert!(exported.contains("ORG:Acme"));
    assert!(exported.contains("VERSION:3.0"));
}

#[test]
fn test_export_preserves_unmanaged_fields() {
    let env = TestEnv::new();
    env.import(
        "contacts.vcf",
        concat!(
            "BEGIN:VCARD\r\n",
            "VERSION:3.0\r\n",
            "FN:Jane Smith\r\n",
            "ADR;TYPE=HOME:;;Main St 1;Springfield;;12345;\r\n",
            "BDAY:1970-01-01\r\n",
            "END:VCARD\r\n"
        ),
    );
    env.cmd().args(["export", "-o", "out.vcf"]).assert().success();

    let exported = fs::read_to_string(env.temp_dir.path().join("out.vcf")).unwrap();
    assert!(exported.contains("ADR;TYPE=HOME:;;Main St 1;Springfield;;12345;"));
    assert!(exported.contains("BDAY:1970-01-01"));
}

#[test]
fn test_export_default_filename_carries_date() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);
    env.cmd().arg("export").assert().success();

    let found = fs::read_dir(env.temp_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .any(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            name.starts_with("vdeck_export_") && name.ends_with(".vcf")
        });
    assert!(found, "expected a vdeck_export_<date>.vcf file");
}

#[test]
fn test_export_empty_working_set_fails() {
    let env = TestEnv::new();
    env.cmd()
        .args(["export", "-o", "out.vcf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to export"));
}

// =============================================================================
// Decoration items and batch apply
// =============================================================================

#[test]
fn test_decorate_and_undecorate_flow() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);

    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();

    env.cmd()
        .args(["apply", "add", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Decorated 1 contacts"));
    assert!(env.list_stdout().contains("Dr. Jane Smith"));

    env.cmd()
        .args(["apply", "remove", "--all"])
        .assert()
        .success();
    let listing = env.list_stdout();
    assert!(listing.contains("Jane Smith"));
    assert!(!listing.contains("Dr. Jane Smith"));
}

#[test]
fn test_apply_respects_selection() {
    let env = TestEnv::new();
    env.import("a.vcf", SAMPLE_VCF);
    env.import("b.vcf", "BEGIN:VCARD\nFN:Bob\nEND:VCARD");

    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();

    let first = env.first_contact_id();
    env.cmd()
        .args(["apply", "add", "--id", first.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Decorated 1 contacts"));

    let listing = env.list_stdout();
    assert!(listing.contains("Dr. Jane Smith"));
    assert!(!listing.contains("Dr. Bob"));
}

#[test]
fn test_org_decoration() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);

    env.cmd()
        .args(["item", "add", "--target", "org", "--role", "suffix", "Inc."])
        .assert()
        .success();
    env.cmd().args(["apply", "add", "--all"]).assert().success();

    assert!(env.list_stdout().contains("Acme Inc."));
}

#[test]
fn test_duplicate_prevention_skips_present_token() {
    let env = TestEnv::new();
    env.import("contacts.vcf", "BEGIN:VCARD\nFN:Dr. Jane Smith\nEND:VCARD");

    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();
    env.cmd().args(["apply", "add", "--all"]).assert().success();

    let listing = env.list_stdout();
    assert!(listing.contains("Dr. Jane Smith"));
    assert!(!listing.contains("Dr. Dr."));
}

#[test]
fn test_custom_separator_from_config() {
    let env = TestEnv::new();
    fs::write(env.config_path(), "prefix_separator = \"-\"\n").unwrap();
    env.import("contacts.vcf", SAMPLE_VCF);

    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();
    env.cmd().args(["apply", "add", "--all"]).assert().success();

    assert!(env.list_stdout().contains("Dr.-Jane Smith"));
}

#[test]
fn test_disabled_item_is_not_applied() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);

    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();

    let items = env.cmd().args(["item", "list"]).output().unwrap();
    let stdout = String::from_utf8(items.stdout).unwrap();
    let id = stdout
        .lines()
        .next()
        .unwrap()
        .split('\t')
        .nth(1)
        .unwrap()
        .to_string();

    env.cmd()
        .args(["item", "toggle", id.as_str()])
        .assert()
        .success();
    env.cmd().args(["apply", "add", "--all"]).assert().success();

    assert!(!env.list_stdout().contains("Dr."));
}

#[test]
fn test_item_add_rejects_empty_text() {
    let env = TestEnv::new();
    env.cmd()
        .args(["item", "add", "--role", "prefix", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_item_add_rejects_duplicate_text() {
    let env = TestEnv::new();
    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();
    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already in the list"));
}

#[test]
fn test_item_rm_unknown_id_is_rejected() {
    let env = TestEnv::new();
    env.cmd()
        .args(["item", "rm", "no-such-id"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no decoration item"));
}

#[test]
fn test_apply_without_selection_fails() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);
    env.cmd()
        .args(["apply", "add"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id or --all"));
}

#[test]
fn test_reset_clears_everything() {
    let env = TestEnv::new();
    env.import("contacts.vcf", SAMPLE_VCF);
    env.cmd()
        .args(["item", "add", "--role", "prefix", "Dr."])
        .assert()
        .success();

    env.cmd().arg("reset").assert().success();

    assert!(env.list_stdout().is_empty());
    let items = env.cmd().args(["item", "list"]).output().unwrap();
    assert!(items.stdout.is_empty());
}
