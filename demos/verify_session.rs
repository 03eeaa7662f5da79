//! Enroll from one typing sample and verify two more against it

use keyprint::pipeline::{enroll_json, verify_json};

fn sample(hold: i64, gap: i64) -> String {
    let mut lines = Vec::new();
    let mut t = 0;
    for key in "correct horse battery".chars().map(|c| c.to_string()) {
        lines.push(format!(r#"{{"timestamp_ms": {t}, "kind": "key_down", "key": "{key}"}}"#));
        lines.push(format!(r#"{{"timestamp_ms": {}, "kind": "key_up", "key": "{key}"}}"#, t + hold));
        t += hold + gap;
    }
    for i in 0..10 {
        lines.push(format!(
            r#"{{"timestamp_ms": {}, "kind": "pointer_move", "x": {}, "y": 20.0}}"#,
            t + i * 16,
            i * 9
        ));
    }
    lines.join("\n")
}

fn main() {
    let profile = match enroll_json("demo-user", &sample(90, 65)) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    for (label, events) in [("same rhythm", sample(90, 65)), ("slow typist", sample(220, 700))] {
        match verify_json(&profile, &events) {
            Ok(report) => println!("{label}: {report}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}
