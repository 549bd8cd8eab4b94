use super::*;

#[test]
fn test_plain_styling_leaves_text_untouched() {
    let styling = StyleManager::new(false);
    assert_eq!(styling.style_error("boom"), "boom");
    assert!(styling.format_success("done").ends_with(" done"));
}

#[test]
fn test_colored_styling_adds_escape_codes() {
    let styling = StyleManager::new(true);
    let styled = styling.style_success("ok");
    assert!(styled.contains("\u{1b}["));
    assert_eq!(console::strip_ansi_codes(&styled), "ok");
}

#[test]
fn test_render_table_aligns_columns() {
    let styling = StyleManager::new(false);
    let rendered = styling.render_table(
        &["ID", "PROMPT"],
        &[
            vec!["a1".to_string(), "short".to_string()],
            vec!["longer-id".to_string(), "x".to_string()],
        ],
    );

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "ID         PROMPT");
    assert_eq!(lines[1], "a1         short");
    assert_eq!(lines[2], "longer-id  x");
}
