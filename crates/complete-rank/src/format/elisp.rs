use complete_model::Candidate;

/// Doubles backslashes and escapes quotes, per spec.md §4.3's "strings are
/// doubled-backslash escaped".
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

pub fn format(candidates: &[Candidate]) -> Vec<u8> {
    let mut out = String::from("(list");
    for c in candidates {
        out.push_str("\n (list :completion \"");
        out.push_str(&escape(&c.completion));
        out.push_str("\" :signature \"");
        out.push_str(&escape(&c.signature));
        out.push_str("\" :annotation \"");
        out.push_str(&escape(opt(&c.annotation)));
        out.push_str("\" :kind \"");
        out.push_str(&escape(&c.cursor_kind.to_string()));
        out.push_str("\" :parent \"");
        out.push_str(&escape(opt(&c.parent)));
        out.push_str("\" :brief \"");
        out.push_str(&escape(opt(&c.brief_comment)));
        out.push_str("\" :priority ");
        out.push_str(&c.priority.to_string());
        out.push_str(" :distance ");
        out.push_str(&c.distance.to_string());
        out.push(')');
    }
    out.push(')');
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use complete_model::CursorKind;

    #[test]
    fn empty_list_round_trips() {
        let bytes = format(&[]);
        assert_eq!(String::from_utf8(bytes).unwrap(), "(list)");
    }

    #[test]
    fn escapes_backslashes_and_quotes() {
        let mut c = Candidate::new(
            r#"foo\bar"baz"#.to_string(),
            "sig".to_string(),
            0,
            CursorKind::VarDecl,
        );
        c.distance = 0;
        let bytes = format(&[c]);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#"foo\\bar\"baz"#));
    }

    #[test]
    fn candidate_count_is_preserved() {
        let candidates: Vec<Candidate> = (0..3)
            .map(|i| Candidate::new(format!("c{i}"), String::new(), 0, CursorKind::VarDecl))
            .collect();
        let bytes = format(&candidates);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches(":completion").count(), 3);
    }
}
