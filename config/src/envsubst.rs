//! # Environment Substitution
//!
//! Expands `${NAME}` placeholders in raw document text before it is decoded.
//!
//! # Supported Forms
//! - `${NAME}`: value of `NAME`
//! - `${NAME:-default}`: value of `NAME`, or `default` when empty
//! - `${NAME-default}`: same as above
//!
//! Defaults may themselves contain placeholders (`${A:-${B}}`).
//! - `$NAME`: value of `NAME`
//! - `$$`: a literal `$`
//!
//! Names made only of decimal digits (`${1}`) are regex capture group
//! references used by relabeling rules further down the line; [`getenv`]
//! hands them back untouched.

use crate::error::SubstitutionError;

/// Expand every placeholder in `input` using `lookup`.
///
/// Either the whole document is expanded or an error is returned; no
/// partially substituted text ever leaves this function.
pub fn expand<F>(input: &str, lookup: F) -> Result<String, SubstitutionError>
where
    F: Fn(&str) -> String
{
    expand_at(input, 0, &lookup)
}

/// Expand `input`, reporting error offsets relative to `base`.
fn expand_at<F>(input: &str, base: usize, lookup: &F) -> Result<String, SubstitutionError>
where
    F: Fn(&str) -> String
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut offset = base;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let start = offset + pos;
        let tail = &rest[pos + 1..];

        let consumed = match tail.chars().next() {
            Some('$') => {
                out.push('$');
                1
            }
            Some('{') => {
                let (value, used) = expand_braced(&tail[1..], start, lookup)?;
                out.push_str(&value);
                used + 1
            }
            Some(c) if is_name_char(c) => {
                let len = tail
                    .find(|c: char| !is_name_char(c))
                    .unwrap_or(tail.len());
                out.push_str(&lookup(&tail[..len]));
                len
            }
            _ => {
                out.push('$');
                0
            }
        };

        let advance = pos + 1 + consumed;
        rest = &rest[advance..];
        offset += advance;
    }
    out.push_str(rest);

    Ok(out)
}

/// Expand placeholders from the process environment.
pub fn expand_env(input: &str) -> Result<String, SubstitutionError> {
    expand(input, getenv)
}

/// Environment lookup used for document substitution.
///
/// Digit-only names are returned as `${name}` so capture group references
/// survive substitution.
pub fn getenv(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        return format!("${{{name}}}");
    }
    std::env::var(name).unwrap_or_default()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand the body of a `${...}` placeholder. `body` starts right after the
/// opening brace. Returns the replacement and the number of bytes consumed,
/// including the closing brace.
fn expand_braced<F>(
    body: &str,
    start: usize,
    lookup: &F
) -> Result<(String, usize), SubstitutionError>
where
    F: Fn(&str) -> String
{
    let close = closing_brace(body).ok_or(SubstitutionError::Unterminated { offset: start })?;
    let inner = &body[..close];

    let name_len = inner
        .find(|c: char| !is_name_char(c))
        .unwrap_or(inner.len());
    let (name, modifier) = inner.split_at(name_len);
    if name.is_empty() {
        return Err(SubstitutionError::EmptyName { offset: start });
    }

    let value = lookup(name);
    if modifier.is_empty() {
        return Ok((value, close + 1));
    }

    let Some(default) = modifier
        .strip_prefix(":-")
        .or_else(|| modifier.strip_prefix('-'))
    else {
        return Err(invalid_modifier(modifier, start));
    };

    let replacement = if value.is_empty() {
        // "${" + name + operator
        let default_offset = start + 2 + name.len() + (modifier.len() - default.len());
        expand_at(default, default_offset, lookup)?
    } else {
        value
    };
    Ok((replacement, close + 1))
}

/// Position of the `}` closing a placeholder body, skipping over nested
/// `${...}` placeholders.
fn closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Characters that start a shell parameter expansion operator.
const MODIFIER_OPERATORS: &[char] = &[':', '=', '?', '+', '^', ',', '#', '%', '/'];

fn invalid_modifier(modifier: &str, start: usize) -> SubstitutionError {
    match modifier.chars().next() {
        Some(c) if MODIFIER_OPERATORS.contains(&c) => SubstitutionError::UnsupportedModifier {
            offset: start,
            modifier: modifier.to_string()
        },
        found => SubstitutionError::InvalidName {
            offset: start,
            found: found.unwrap_or('}')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn lookup(name: &str) -> String {
        match name {
            "HOST" => "localhost".to_string(),
            "PORT" => "9090".to_string(),
            _ => getenv(name)
        }
    }

    #[test]
    fn test_expand_braced_and_bare() {
        let out = expand("url: http://${HOST}:$PORT/metrics", lookup).unwrap();
        assert_eq!(out, "url: http://localhost:9090/metrics");
    }

    #[test]
    fn test_expand_keeps_digit_placeholders() {
        let out = expand("replacement: ${1}-${23}", lookup).unwrap();
        assert_eq!(out, "replacement: ${1}-${23}");
    }

    #[test]
    fn test_expand_bare_digits_become_braced() {
        let out = expand("replacement: $1", lookup).unwrap();
        assert_eq!(out, "replacement: ${1}");
    }

    #[test]
    fn test_expand_defaults() {
        let out = expand("a: ${MISSING:-fallback}, b: ${HOST:-other}, c: ${NOPE-x}", lookup)
            .unwrap();
        assert_eq!(out, "a: fallback, b: localhost, c: x");
    }

    #[test]
    fn test_expand_escaped_and_lone_dollars() {
        let out = expand("price: $$5, regex: ^foo$, brace: $ {x}", lookup).unwrap();
        assert_eq!(out, "price: $5, regex: ^foo$, brace: $ {x}");
    }

    #[test]
    fn test_expand_multibyte_text() {
        let out = expand("label: “${HOST}” ✓", lookup).unwrap();
        assert_eq!(out, "label: “localhost” ✓");
    }

    #[test]
    fn test_expand_unterminated() {
        let err = expand("a: 1\nb: ${HOST", lookup).unwrap_err();
        assert_eq!(err, SubstitutionError::Unterminated { offset: 8 });
    }

    #[test]
    fn test_expand_empty_name() {
        let err = expand("a: ${}", lookup).unwrap_err();
        assert_eq!(err, SubstitutionError::EmptyName { offset: 3 });
    }

    #[test]
    fn test_expand_invalid_name() {
        let err = expand("a: ${BAD NAME}", lookup).unwrap_err();
        assert_eq!(
            err,
            SubstitutionError::InvalidName {
                offset: 3,
                found: ' '
            }
        );
    }

    #[test]
    fn test_expand_nested_default() {
        let lookup = |name: &str| match name {
            "B" => "bee".to_string(),
            _ => String::new()
        };
        assert_eq!(expand("${A:-${B}}", lookup).unwrap(), "bee");
        assert_eq!(expand("x: ${A:-${C:-${B}}}/y", lookup).unwrap(), "x: bee/y");
        assert_eq!(expand("${B:-${A}}", lookup).unwrap(), "bee");
    }

    #[test]
    fn test_expand_nested_unterminated() {
        let err = expand("a: ${A:-${B}", lookup).unwrap_err();
        assert_eq!(err, SubstitutionError::Unterminated { offset: 3 });
    }

    #[test]
    fn test_expand_nested_default_error_offset() {
        let err = expand("a: ${A:-${}}", |_: &str| String::new()).unwrap_err();
        assert_eq!(err, SubstitutionError::EmptyName { offset: 8 });
    }

    #[test]
    fn test_expand_unsupported_modifiers() {
        let err = expand("a: ${VAR:=x}", lookup).unwrap_err();
        assert_eq!(
            err,
            SubstitutionError::UnsupportedModifier {
                offset: 3,
                modifier: ":=x".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "unsupported modifier \":=x\" at offset 3: only ${NAME}, ${NAME:-default} and \
             ${NAME-default} are supported"
        );

        let err = expand("${VAR^^}", lookup).unwrap_err();
        assert!(matches!(err, SubstitutionError::UnsupportedModifier { .. }));
    }

    #[test]
    #[serial]
    fn test_expand_env_reads_process_environment() {
        unsafe {
            std::env::set_var("ENVSUBST_TEST_TIMEOUT", "33s");
            std::env::remove_var("ENVSUBST_TEST_UNSET");
        }

        let out = expand_env("timeout: ${ENVSUBST_TEST_TIMEOUT}, x: '${ENVSUBST_TEST_UNSET}'")
            .unwrap();
        assert_eq!(out, "timeout: 33s, x: ''");

        unsafe {
            std::env::remove_var("ENVSUBST_TEST_TIMEOUT");
        }
    }
}
