use complete_model::Candidate;

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

/// One line per candidate: `completion signature kind parent brief`
/// (spec.md §4.3).
pub fn format(candidates: &[Candidate]) -> Vec<u8> {
    let mut out = String::new();
    for c in candidates {
        out.push_str(&c.completion);
        out.push(' ');
        out.push_str(&c.signature);
        out.push(' ');
        out.push_str(&c.cursor_kind.to_string());
        out.push(' ');
        out.push_str(opt(&c.parent));
        out.push(' ');
        out.push_str(opt(&c.brief_comment));
        out.push('\n');
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use complete_model::CursorKind;

    #[test]
    fn one_line_per_candidate() {
        let candidates: Vec<Candidate> = (0..3)
            .map(|i| Candidate::new(format!("c{i}"), "sig".to_string(), 0, CursorKind::VarDecl))
            .collect();
        let bytes = format(&candidates);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn fields_are_space_separated() {
        let c = Candidate::new("foo".to_string(), "foo(int)".to_string(), 0, CursorKind::FunctionDecl);
        let bytes = format(&[c]);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "foo foo(int) FunctionDecl  \n");
    }
}
