use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_render_reads_markdown_from_stdin() {
    cargo_bin_cmd!("parley")
        .arg("render")
        .write_stdin("# Title\n\nSee [docs](https://example.com).")
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1"))
        .stdout(predicate::str::contains(r#"<a href="https://example.com""#))
        .stdout(predicate::str::contains(r#"rel="noopener noreferrer">docs</a>"#));
}

#[test]
fn test_render_escapes_raw_html() {
    cargo_bin_cmd!("parley")
        .arg("render")
        .write_stdin("<script>alert(1)</script>")
        .assert()
        .success()
        .stdout(predicate::str::contains("&lt;script&gt;"))
        .stdout(predicate::str::contains("<script>").not());
}
