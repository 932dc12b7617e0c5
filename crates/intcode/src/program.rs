use crate::error::ParseError;

/// Parses a program line: comma-separated base-10 signed integers.
///
/// The line's surrounding whitespace (including the newline) is ignored;
/// whitespace inside a cell is an error.
pub fn parse(text: &str) -> Result<Vec<i64>, ParseError> {
    let line = text.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    line.split(',')
        .enumerate()
        .map(|(index, token)| {
            token.parse::<i64>().map_err(|_| ParseError::InvalidCell {
                index,
                token: token.to_string(),
            })
        })
        .collect()
}
