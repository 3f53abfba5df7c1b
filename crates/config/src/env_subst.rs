/// Expand `${VAR}` and `${VAR:-fallback}` placeholders from the environment.
///
/// A placeholder whose variable is unset and has no fallback is kept verbatim,
/// so a missing secret shows up in the parsed value instead of vanishing.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let inner = &after[..end];
        let (name, fallback) = match inner.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (inner, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(inner);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_env(name: &str) -> Option<String> {
        match name {
            "SCRIBE_PORT" => Some("9100".into()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(substitute_with("port = ${SCRIBE_PORT}", fake_env), "port = 9100");
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(substitute_with("${SCRIBE_NOPE}", fake_env), "${SCRIBE_NOPE}");
    }

    #[test]
    fn uses_fallback_when_unset() {
        assert_eq!(substitute_with("${SCRIBE_NOPE:-memory}", fake_env), "memory");
        assert_eq!(substitute_with("${SCRIBE_PORT:-1}", fake_env), "9100");
    }

    #[test]
    fn set_but_empty_wins_over_fallback() {
        assert_eq!(substitute_with("[${EMPTY:-x}]", fake_env), "[]");
    }

    #[test]
    fn unterminated_and_empty_names_are_literal() {
        assert_eq!(substitute_with("a ${SCRIBE_PORT", fake_env), "a ${SCRIBE_PORT");
        assert_eq!(substitute_with("${}", fake_env), "${}");
    }

    #[test]
    #[allow(unsafe_code)]
    fn reads_process_env() {
        unsafe { std::env::set_var("SCRIBE_ENV_SUBST_TEST", "hello") };
        assert_eq!(substitute_env("key=${SCRIBE_ENV_SUBST_TEST}"), "key=hello");
        unsafe { std::env::remove_var("SCRIBE_ENV_SUBST_TEST") };
    }
}
