use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{Rgba, RgbaImage};
use printpdf::lopdf;

const HEADER: &str = "id\tset\tnotes\ttype\tinterrupt\ttext\timage\n\n--\n";

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_deck-pdf"))
}

fn output_dir() -> &'static Path {
    Path::new("tests/output")
}

fn setup() {
    fs::create_dir_all(output_dir()).expect("Failed to create output directory");
}

fn cleanup_file(name: &str) {
    let path = output_dir().join(name);
    if path.exists() {
        fs::remove_file(&path).ok();
    }
}

fn write_deck(name: &str, rows: &[&str]) -> PathBuf {
    let mut content = HEADER.to_string();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    let path = output_dir().join(name);
    fs::write(&path, content).expect("Failed to write deck");
    path
}

fn write_images(dir_name: &str) -> PathBuf {
    let dir = output_dir().join(dir_name);
    fs::create_dir_all(&dir).expect("Failed to create image directory");

    let mut marker = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
    for y in 0..32 {
        marker.put_pixel(0, y, Rgba([0, 0, 0, 0]));
    }
    marker.save(dir.join("interrupt.png")).expect("Failed to write marker");

    RgbaImage::from_pixel(40, 20, Rgba([30, 120, 200, 255]))
        .save(dir.join("harbour.png"))
        .expect("Failed to write illustration");
    RgbaImage::from_pixel(12, 12, Rgba([255, 255, 255, 255]))
        .save(dir.join("star.png"))
        .expect("Failed to write icon");
    dir
}

fn assert_pdf(path: &Path) {
    assert!(path.exists(), "PDF file was not created");
    let bytes = fs::read(path).expect("Failed to read PDF");
    assert!(bytes.starts_with(b"%PDF"), "Output is not a PDF");
    assert!(bytes.len() > 1000, "PDF file is too small, likely empty or corrupt");
}

/// Page count plus the raw operand of every Tj/TJ text operator.
fn read_pdf(path: &Path) -> (usize, Vec<Vec<u8>>) {
    let doc = lopdf::Document::load(path).expect("Failed to parse PDF");
    let pages = doc.get_pages();
    let mut shown = Vec::new();
    for page_id in pages.values() {
        let content = doc.get_page_content(*page_id).expect("Failed to read page content");
        let content = lopdf::content::Content::decode(&content).expect("Failed to decode content");
        for op in content.operations {
            for operand in op.operands {
                match (op.operator.as_str(), operand) {
                    ("Tj", lopdf::Object::String(bytes, _)) => shown.push(bytes),
                    ("TJ", lopdf::Object::Array(items)) => shown.push(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                lopdf::Object::String(bytes, _) => Some(bytes),
                                _ => None,
                            })
                            .flatten()
                            .collect(),
                    ),
                    _ => {}
                }
            }
        }
    }
    (pages.len(), shown)
}

fn shown_text(path: &Path) -> (usize, Vec<String>) {
    let (pages, shown) = read_pdf(path);
    let text = shown
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .collect();
    (pages, text)
}

#[test]
fn test_basic_deck() {
    setup();
    let output_file = "test-basic-deck.pdf";
    cleanup_file(output_file);
    let deck = write_deck(
        "basic.tsv",
        &[
            "1\t\t\tEvent\t\tHello",
            "2\t\t\tThing\t\tA brass lamp",
            "3\t\t\tAspect\t\tBrave",
            "",
            "4\t\t\tCharacter\t\tThe ferryman",
            "5\t\t\tPlace\t\tThe harbour",
            "6\t\t\tEnding\t\tAnd they all went home.",
        ],
    );

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "--images", "tests/output/no-images",
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cards: 6"), "Unexpected summary: {}", stdout);
    assert!(stdout.contains("Pages: 1"), "Unexpected summary: {}", stdout);
    assert!(stdout.contains("Skipped rows: 1"), "Unexpected summary: {}", stdout);

    let path = output_dir().join(output_file);
    assert_pdf(&path);
    let (pages, text) = shown_text(&path);
    assert_eq!(pages, 1);
    for expected in ["Evento", "Hello", "Trajto", "Brave", "Fino"] {
        assert!(text.iter().any(|t| t == expected), "'{}' not drawn: {:?}", expected, text);
    }
    // Builtin fonts fall back to the base letter for Esperanto titles
    assert!(text.iter().any(|t| t == "Ajo"), "Thing title not drawn: {:?}", text);
}

#[test]
fn test_ten_cards_two_pages() {
    setup();
    let output_file = "test-two-pages.pdf";
    cleanup_file(output_file);
    let rows: Vec<String> = (1..=10)
        .map(|i| format!("{}\t\t\tEvent\t\tCard number {}", i, i))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let deck = write_deck("ten.tsv", &rows);

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pages: 2"), "Unexpected summary: {}", stdout);
    let path = output_dir().join(output_file);
    assert_pdf(&path);
    let (pages, text) = shown_text(&path);
    assert_eq!(pages, 2);
    assert!(text.iter().any(|t| t == "Card number 10"), "Last card missing: {:?}", text);
}

#[test]
fn test_assets_and_config() {
    setup();
    let output_file = "test-assets.pdf";
    cleanup_file(output_file);
    let images = write_images("images-assets");
    let deck = write_deck(
        "assets.tsv",
        &[
            "1\t\t\tEvent\tY\tNot so fast",
            "2\t\t\tPlace\t\tThe harbour\tharbour.png",
            "3\t\t\tCharacter\t\tThe ferryman",
        ],
    );
    let config = output_dir().join("assets-config.json");
    fs::write(
        &config,
        r#"{
            "palette": { "Character": { "name": "Character", "color": "9A031E", "icon": "star.png" } },
            "fonts": { "body": { "family": "helvetica", "size": 8 } }
        }"#,
    )
    .expect("Failed to write config");

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "--images", images.to_str().unwrap(),
            "-c", config.to_str().unwrap(),
            "--title", "Asset test",
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&output_dir().join(output_file));
}

#[test]
fn test_unknown_category_fails() {
    setup();
    let deck = write_deck(
        "unknown.tsv",
        &["1\t\t\tEvent\t\tFine", "2\t\t\tUnknown\t\tBroken"],
    );
    cleanup_file("should-not-exist-unknown.pdf");

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-o", "tests/output/should-not-exist-unknown.pdf",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for unknown category");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 5"), "Unexpected error: {}", stderr);
    assert!(stderr.contains("Unknown"), "Unexpected error: {}", stderr);
    // No page was completed, so nothing is written
    assert!(!output_dir().join("should-not-exist-unknown.pdf").exists());
}

#[test]
fn test_unknown_category_keeps_completed_pages() {
    setup();
    let output_file = "test-partial.pdf";
    cleanup_file(output_file);
    let mut rows: Vec<String> = (1..=10)
        .map(|i| format!("{}\t\t\tEvent\t\tCard number {}", i, i))
        .collect();
    rows.push("11\t\t\tUnknown\t\tBroken".to_string());
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let deck = write_deck("partial.tsv", &rows);

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for unknown category");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 14"), "Unexpected error: {}", stderr);
    assert!(stderr.contains("1 complete pages"), "Unexpected error: {}", stderr);

    let path = output_dir().join(output_file);
    assert_pdf(&path);
    let (pages, text) = shown_text(&path);
    assert_eq!(pages, 1);
    assert!(text.iter().any(|t| t == "Card number 9"), "{:?}", text);
    // Card 10 sat on the unfinished second page
    assert!(!text.iter().any(|t| t == "Card number 10"), "{:?}", text);
}

#[test]
fn test_embedded_font_draws_esperanto() {
    setup();
    let output_file = "test-esperanto.pdf";
    cleanup_file(output_file);
    let deck = write_deck("esperanto.tsv", &["1\t\t\tThing\t\tŜipo ĉe la ĥaveno"]);
    let config = output_dir().join("font-config.json");
    fs::write(
        &config,
        r#"{
            "fonts": {
                "title": { "file": "tests/fixtures/DejaVuSans.ttf", "size": 10 },
                "body": { "file": "tests/fixtures/DejaVuSans.ttf", "size": 9 }
            }
        }"#,
    )
    .expect("Failed to write config");

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-c", config.to_str().unwrap(),
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);

    let font = fs::read("tests/fixtures/DejaVuSans.ttf").expect("Failed to read font fixture");
    let face = ttf_parser::Face::parse(&font, 0).expect("Failed to parse font fixture");
    let glyphs = |text: &str| -> Vec<u8> {
        text.chars()
            .filter_map(|c| face.glyph_index(c))
            .flat_map(|g| g.0.to_be_bytes())
            .collect()
    };

    let path = output_dir().join(output_file);
    assert_pdf(&path);
    let (pages, shown) = read_pdf(&path);
    assert_eq!(pages, 1);
    assert!(shown.contains(&glyphs("Aĵo")), "Title not drawn with its Esperanto letter");
    assert!(shown.contains(&glyphs("Ŝipo ĉe la ĥaveno")), "Body text lost letters");
}

#[test]
fn test_malformed_flag_fails() {
    setup();
    let deck = write_deck("maybe.tsv", &["1\t\t\tEvent\tmaybe\tHello"]);

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-o", "tests/output/should-not-exist-flag.pdf",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for malformed flag");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("maybe"), "Unexpected error: {}", stderr);
}

#[test]
fn test_missing_asset_policy() {
    setup();
    let deck = write_deck(
        "missing-asset.tsv",
        &["1\t\t\tPlace\t\tNowhere\tnowhere.png", "2\t\t\tPlace\t\tSomewhere"],
    );

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "--images", "tests/output/no-images",
            "-o", "tests/output/should-not-exist-asset.pdf",
        ])
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success(), "Command should have failed for missing asset");

    let output_file = "test-skip-missing.pdf";
    cleanup_file(output_file);
    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "--images", "tests/output/no-images",
            "--skip-missing-assets",
            "-o", &format!("tests/output/{}", output_file),
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Skipped cards (missing assets): 1"), "Unexpected summary: {}", stdout);
    assert_pdf(&output_dir().join(output_file));
}

#[test]
fn test_invalid_input_file() {
    let output = cargo_bin()
        .args([
            "-i", "nonexistent.tsv",
            "-o", "tests/output/should-not-exist.pdf",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for missing input");
}

#[test]
fn test_invalid_config() {
    setup();
    let deck = write_deck("config-check.tsv", &["1\t\t\tEvent\t\tHello"]);
    let config = output_dir().join("bad-config.json");
    fs::write(&config, r#"{ "palette": { "Event": { "name": "E", "color": "12345" } } }"#)
        .expect("Failed to write config");

    let output = cargo_bin()
        .args([
            "-i", deck.to_str().unwrap(),
            "-c", config.to_str().unwrap(),
            "-o", "tests/output/should-not-exist-config.pdf",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Command should have failed for malformed color");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Malformed color"), "Unexpected error: {}", stderr);
}
