use complete_model::Candidate;
use serde_json::{json, Value};

fn candidate_json(c: &Candidate) -> Value {
    json!({
        "completion": c.completion,
        "signature": c.signature,
        "annotation": c.annotation,
        "kind": c.cursor_kind.to_string(),
        "parent": c.parent,
        "brief": c.brief_comment,
        "priority": c.priority,
        "distance": c.distance,
    })
}

pub fn format(candidates: &[Candidate]) -> Vec<u8> {
    let value = json!({
        "completions": candidates.iter().map(candidate_json).collect::<Vec<_>>(),
    });
    serde_json::to_vec(&value).expect("candidate list is always representable as JSON")
}
