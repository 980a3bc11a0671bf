//! Whitespace token scanning for the plain-text grid formats.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::BufRead;

use crate::error::{FlowgridError, FlowgridResult};

/// Rewrite a Fortran-style exponent ("1.0d5") into the 'e' form the
/// standard float parser accepts.
pub fn normalize_exponent(token: &str) -> Cow<'_, str> {
    if token.contains(['d', 'D']) {
        Cow::Owned(token.replace('d', "e").replace('D', "E"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Parse one numeric token, accepting Fortran d-exponents and "nan".
pub fn parse_float(token: &str) -> FlowgridResult<f64> {
    normalize_exponent(token)
        .parse::<f64>()
        .map_err(|_| FlowgridError::format(format!("invalid numeric token '{token}'")))
}

/// Parse a token that must hold an integer value, written either as a
/// plain integer or as a float with no fractional part.
pub fn parse_int(token: &str) -> FlowgridResult<i64> {
    let value = parse_float(token)?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(FlowgridError::format(format!(
            "expected an integer, found '{token}'"
        )));
    }
    Ok(value as i64)
}

/// Parse a non-negative integer token.
pub fn parse_count(token: &str) -> FlowgridResult<usize> {
    let value = parse_int(token)?;
    usize::try_from(value).map_err(|_| {
        FlowgridError::format(format!("expected a non-negative count, found '{token}'"))
    })
}

/// Pulls whitespace-separated tokens off a line-oriented reader,
/// crossing line boundaries as needed.
pub struct TokenReader<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> FlowgridResult<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }

    /// Read exactly `count` numeric values, however they are wrapped
    /// across lines.
    pub fn take_floats(&mut self, count: usize) -> FlowgridResult<Vec<f64>> {
        let mut values = Vec::with_capacity(count);
        while values.len() < count {
            match self.next_token()? {
                Some(token) => values.push(parse_float(&token)?),
                None => {
                    return Err(FlowgridError::format(format!(
                        "expected {count} values, input ended after {}",
                        values.len()
                    )))
                }
            }
        }
        Ok(values)
    }

    /// Drain every remaining numeric value.
    pub fn take_all_floats(&mut self) -> FlowgridResult<Vec<f64>> {
        let mut values = Vec::new();
        while let Some(token) = self.next_token()? {
            values.push(parse_float(&token)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_float_d_exponent() {
        assert_eq!(parse_float("1.0d5").unwrap(), 1.0e5);
        assert_eq!(parse_float("-2.5D-3").unwrap(), -2.5e-3);
        assert_eq!(parse_float("3.25").unwrap(), 3.25);
        assert!(parse_float("nan").unwrap().is_nan());
        assert!(parse_float("bogus").is_err());
    }

    #[test]
    fn test_parse_int_rules() {
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int("-7").unwrap(), -7);
        assert_eq!(parse_int("100.0").unwrap(), 100);
        assert!(parse_int("1.5").is_err());
        assert!(parse_count("-1").is_err());
        assert_eq!(parse_count("12").unwrap(), 12);
    }

    #[test]
    fn test_take_floats_across_lines() {
        let input = Cursor::new("1.0 2.0\n3.0\n4.0 5.0 6.0\n");
        let mut tokens = TokenReader::new(input);
        assert_eq!(tokens.take_floats(4).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tokens.take_floats(2).unwrap(), vec![5.0, 6.0]);
        assert!(tokens.next_token().unwrap().is_none());
    }

    #[test]
    fn test_take_floats_truncated_input() {
        let input = Cursor::new("1.0 2.0\n");
        let mut tokens = TokenReader::new(input);
        assert!(tokens.take_floats(3).is_err());
    }

    #[test]
    fn test_take_all_floats_skips_blank_lines() {
        let input = Cursor::new("1.0\n\n2.0\n\n\n3.0\n");
        let mut tokens = TokenReader::new(input);
        assert_eq!(tokens.take_all_floats().unwrap(), vec![1.0, 2.0, 3.0]);
    }
}
