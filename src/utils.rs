use crate::engine::{Configuration, BOARD_SIZE, CELL_COUNT};
use crate::error::ConfigurationError;

fn parse_error(reason: String) -> ConfigurationError {
    ConfigurationError::Parse { reason }
}

/// Parses an array of string slices, one per board row, into a `Configuration`.
///
/// Row 0 comes first. If fewer than `BOARD_SIZE` rows are provided, the
/// remaining rows are empty; a row shorter than `BOARD_SIZE` characters is
/// padded with empty cells.
///
/// Valid characters:
/// - `o`, `O`, `x`, `X`, `1`: a marble
/// - `.`, `0`, `_`, ` `: no marble (also used for cut corner cells)
///
/// # Returns
/// * `Ok(Configuration)` if parsing succeeds and no marble sits on a cut corner.
/// * `Err(ConfigurationError::Parse)` if there are too many rows, a row is too
///   long, or a character is not recognised.
/// * `Err(ConfigurationError::CornerCell)` if a marble is placed on a cut corner.
///
/// # Examples
/// ```
/// use peg_solver::utils::configuration_from_str_array;
///
/// let config = configuration_from_str_array(&[
///     "  ooo  ",
///     " ooooo ",
///     "ooooooo",
///     "ooo.ooo",
///     "ooooooo",
///     " ooooo ",
///     "  ooo  ",
/// ]).unwrap();
/// assert_eq!(config.marble_count(), 36);
/// assert!(!config.is_marble(3, 3));
///
/// assert!(configuration_from_str_array(&["o"]).is_err()); // (0, 0) is a cut corner
/// assert!(configuration_from_str_array(&["..?"]).is_err());
/// ```
pub fn configuration_from_str_array(rows: &[&str]) -> Result<Configuration, ConfigurationError> {
    if rows.len() > BOARD_SIZE {
        return Err(parse_error(format!(
            "Invalid number of rows. Expected at most {}, found {}",
            BOARD_SIZE,
            rows.len()
        )));
    }

    let mut bits = 0u64;
    for (r, row_str) in rows.iter().enumerate() {
        let len = row_str.chars().count();
        if len > BOARD_SIZE {
            return Err(parse_error(format!(
                "Row {} is too long. Expected at most {} characters, found {}",
                r, BOARD_SIZE, len
            )));
        }

        for (c, ch) in row_str.chars().enumerate() {
            let marble = match ch {
                'o' | 'O' | 'x' | 'X' | '1' => true,
                '.' | '0' | '_' | ' ' => false,
                _ => {
                    return Err(parse_error(format!(
                        "Unrecognized character '{}' in row {} col {}",
                        ch, r, c
                    )))
                }
            };
            if marble {
                bits |= 1u64 << (CELL_COUNT - 1 - (r * BOARD_SIZE + c));
            }
        }
    }
    Configuration::from_bits(bits)
}

/// Parses a configuration from a single string.
///
/// Three forms are accepted:
/// - binary with a `0b` prefix, underscores allowed (`0b0011100_0111110_...`);
/// - a decimal integer;
/// - a grid of rows separated by newlines or `/`, as accepted by
///   [`configuration_from_str_array`]. Blank lines are skipped.
///
/// Numeric forms use the 49-bit layout where the most significant bit is
/// row 0, column 0.
///
/// Input made only of ASCII digits is always read as a decimal number, even
/// when it looks like a single grid row of `0`/`1` cells. To give a one-row
/// grid in that alphabet, add a `/` separator (`"0000100/"`) or use the
/// `o`/`.` characters.
///
/// # Examples
/// ```
/// use peg_solver::utils::parse_configuration;
///
/// let a = parse_configuration("0b0011100_0111110_1111111_1110111_1111111_0111110_0011100").unwrap();
/// let b = parse_configuration("  ooo  / ooooo /ooooooo/ooo.ooo/ooooooo/ ooooo /  ooo").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(parse_configuration(&a.bits().to_string()).unwrap(), a);
/// ```
pub fn parse_configuration(input: &str) -> Result<Configuration, ConfigurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(parse_error("empty input".to_string()));
    }

    if let Some(binary) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        let digits: String = binary.chars().filter(|&c| c != '_').collect();
        let bits = u64::from_str_radix(&digits, 2)
            .map_err(|e| parse_error(format!("Invalid binary number '{}': {}", trimmed, e)))?;
        return Configuration::from_bits(bits);
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let bits = trimmed
            .parse::<u64>()
            .map_err(|e| parse_error(format!("Invalid number '{}': {}", trimmed, e)))?;
        return Configuration::from_bits(bits);
    }

    // Leading and trailing spaces are significant inside a grid row.
    let rows: Vec<&str> = input
        .split(|c| c == '\n' || c == '/')
        .map(|row| row.trim_end_matches('\r'))
        .filter(|row| !row.trim().is_empty())
        .collect();
    configuration_from_str_array(&rows)
}
