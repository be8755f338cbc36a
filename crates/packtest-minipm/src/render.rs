use anstyle::{AnsiColor, Style};

/// One-line status in the `Label message` shape. Color is opt-in via
/// `MINIPM_COLOR=always` so captured test output stays plain.
pub fn status_line(label: &str, message: &str) -> String {
    if !color_enabled() {
        return format!("{label} {message}");
    }
    let style = Style::new()
        .bold()
        .fg_color(Some(AnsiColor::Green.into()));
    format!("{}{label}{} {message}", style.render(), style.render_reset())
}

pub fn file_count_fragment(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}

fn color_enabled() -> bool {
    std::env::var("MINIPM_COLOR")
        .map(|value| value == "always")
        .unwrap_or(false)
}
