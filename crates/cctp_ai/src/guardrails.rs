use cctp_core::error::AppError;
use cctp_core::markers::EXTRACTION_GRAMMAR;

/// Lines shorter than this that are entirely uppercase are treated as stray titles.
const MAX_UPPERCASE_TITLE_CHARS: usize = 80;

/// Strip presentation noise a generator tends to add around a section body: `---`
/// separators, whole-line `**bold**` titles, short all-caps titles, Markdown `#` headings and
/// blank lines. Marker syntax is left untouched.
pub fn clean_generated_text(text: &str) -> String {
    text.lines()
        .filter(|line| !is_noise_line(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_noise_line(line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    if EXTRACTION_GRAMMAR.iter().any(|rule| rule.pattern().is_match(line)) {
        return false;
    }
    line == "---"
        || is_bold_title(line)
        || is_uppercase_title(line)
        || is_markdown_heading(line)
}

fn is_bold_title(line: &str) -> bool {
    line.len() > 4 && line.starts_with("**") && line.ends_with("**")
}

/// At least one cased letter and no lowercase ones.
fn is_uppercase_title(line: &str) -> bool {
    line.chars().count() < MAX_UPPERCASE_TITLE_CHARS
        && line.chars().any(char::is_uppercase)
        && !line.chars().any(char::is_lowercase)
}

fn is_markdown_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    hashes > 0 && line[hashes..].starts_with(char::is_whitespace)
}

/// Reject generator output that is empty once cleaned.
pub fn enforce_non_empty(cleaned: &str) -> Result<(), AppError> {
    if cleaned.trim().is_empty() {
        return Err(AppError::new(
            "AI_OUTPUT_EMPTY",
            "Generated text was empty after cleanup",
        ));
    }
    Ok(())
}
