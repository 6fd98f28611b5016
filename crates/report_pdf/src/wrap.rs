//! Greedy word wrapping against measured text widths.

use crate::metrics::{FontWeight, TextMeasure};

/// Wraps one source line into lines no wider than `width`.
///
/// Words are taken greedily. A word that is wider than `width` on its own still gets a line of
/// its own; words are never split.
pub fn wrap_line(
    line: &str,
    width: f64,
    measure: &dyn TextMeasure,
    weight: FontWeight,
    size: u8,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure.measure(weight, &candidate, size) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Wraps every `\n`-separated source line of `text` in order.
pub fn wrap_text(
    text: &str,
    width: f64,
    measure: &dyn TextMeasure,
    weight: FontWeight,
    size: u8,
) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| wrap_line(line, width, measure, weight, size))
        .collect()
}
