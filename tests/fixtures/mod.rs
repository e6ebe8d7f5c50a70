//! Canned backend responses

#![allow(dead_code)]

use serde_json::{json, Value};

/// Start response pointing at a state URL on the test backend.
pub fn handle(state_path: &str) -> Value {
    json!({ "stateUrl": format!("http://miner.test:5000{}", state_path) })
}

pub fn pending() -> Value {
    json!({ "done": false })
}

pub fn done(result_path: &str) -> Value {
    json!({ "done": true, "resultUrl": format!("http://miner.test:5000{}", result_path) })
}

/// Graph payload whose image decodes to `A`.
pub fn graph_payload() -> Value {
    json!({
        "image": "data:text/vnd.graphviz;charset=utf-8;base64,QQ==",
        "metadata": {
            "banks": { "Commerzbank": 6, "Sparkasse": 4 },
            "methods": { "get_accounts": 7, "get_transactions": 3 },
            "errors": { "E1": 3, "E2": 1 }
        },
        "numberOfSessions": 10
    })
}

/// Heuristic net of a small redirect flow, as DOT text.
pub const REDIRECT_DOT: &str = "digraph {\n  start -> consent;\n  consent -> redirect;\n  redirect -> get_accounts;\n}";
