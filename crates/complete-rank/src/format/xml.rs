use complete_model::Candidate;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

pub fn format(candidates: &[Candidate]) -> Vec<u8> {
    let mut out = String::from("<completions>");
    for c in candidates {
        out.push_str("\n  <completion completion=\"");
        out.push_str(&escape(&c.completion));
        out.push_str("\" signature=\"");
        out.push_str(&escape(&c.signature));
        out.push_str("\" annotation=\"");
        out.push_str(&escape(opt(&c.annotation)));
        out.push_str("\" kind=\"");
        out.push_str(&escape(&c.cursor_kind.to_string()));
        out.push_str("\" parent=\"");
        out.push_str(&escape(opt(&c.parent)));
        out.push_str("\" brief=\"");
        out.push_str(&escape(opt(&c.brief_comment)));
        out.push_str("\" priority=\"");
        out.push_str(&c.priority.to_string());
        out.push_str("\" distance=\"");
        out.push_str(&c.distance.to_string());
        out.push_str("\"/>");
    }
    out.push_str("\n</completions>");
    out.into_bytes()
}
