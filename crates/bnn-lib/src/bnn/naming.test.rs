use super::*;
use chrono::TimeZone;
use tempfile::TempDir;

fn fixed_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

#[test]
fn test_timestamp_scheme() {
    let namer = OutputNamer::new("out", NamingScheme::Timestamp);
    assert_eq!(
        namer.next_path_at("anything", "png", fixed_time()),
        PathBuf::from("out/bnn-20260314-092653.png")
    );
}

#[test]
fn test_prompt_scheme_uses_slug_and_time() {
    let namer = OutputNamer::new("out", NamingScheme::Prompt);
    assert_eq!(
        namer.next_path_at("Make the sky PURPLE, please!", "jpg", fixed_time()),
        PathBuf::from("out/make-the-sky-purple-please-092653.jpg")
    );
    assert_eq!(
        namer.next_path_at("!!!", "png", fixed_time()),
        PathBuf::from("out/bnn-092653.png")
    );
}

#[test]
fn test_slugify_limits_words_and_length() {
    assert_eq!(slugify("one two three four five six seven"), "one-two-three-four-five-six");
    let long = slugify("supercalifragilisticexpialidocious antidisestablishmentarianism");
    assert!(long.len() <= 48);
    assert!(!long.ends_with('-'));
}

#[test]
fn test_sequential_scheme_continues_after_highest() {
    let temp = TempDir::new().unwrap();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Sequential);
    assert_eq!(
        namer.next_path("p", "png"),
        temp.path().join("bnn-0001.png")
    );

    fs::write(temp.path().join("bnn-0001.png"), b"x").unwrap();
    fs::write(temp.path().join("bnn-0007.jpg"), b"x").unwrap();
    fs::write(temp.path().join("bnn-notes.txt"), b"x").unwrap();
    assert_eq!(
        namer.next_path("p", "webp"),
        temp.path().join("bnn-0008.webp")
    );
}

#[test]
fn test_sequential_scheme_in_missing_directory_starts_at_one() {
    let temp = TempDir::new().unwrap();
    let namer = OutputNamer::new(temp.path().join("absent"), NamingScheme::Sequential);
    assert!(namer.next_path("p", "png").ends_with("bnn-0001.png"));
}

#[test]
fn test_same_second_outputs_do_not_overwrite() {
    let temp = TempDir::new().unwrap();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Timestamp);

    let first = namer.next_path_at("p", "png", fixed_time());
    assert_eq!(first, temp.path().join("bnn-20260314-092653.png"));
    fs::write(&first, b"first").unwrap();

    let second = namer.next_path_at("p", "png", fixed_time());
    assert_eq!(second, temp.path().join("bnn-20260314-092653-2.png"));
    fs::write(&second, b"second").unwrap();

    assert_eq!(
        namer.next_path_at("p", "png", fixed_time()),
        temp.path().join("bnn-20260314-092653-3.png")
    );
}

#[test]
fn test_prompt_scheme_suffixes_a_taken_name() {
    let temp = TempDir::new().unwrap();
    let namer = OutputNamer::new(temp.path(), NamingScheme::Prompt);
    fs::write(temp.path().join("a-fox-092653.png"), b"x").unwrap();

    assert_eq!(
        namer.next_path_at("a fox", "png", fixed_time()),
        temp.path().join("a-fox-092653-2.png")
    );
    // a different extension is a different file
    assert_eq!(
        namer.next_path_at("a fox", "jpg", fixed_time()),
        temp.path().join("a-fox-092653.jpg")
    );
}
