use crate::support::{skillbench, write_file};
use predicates::prelude::*;
use tempfile::tempdir;

const TRANSCRIPT: &str = r#"progress: loading skill
{"type":"assistant","message":{"model":"claude-haiku","content":[{"type":"text","text":"Done"},{"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"ls"}}]},"inputTokens":12,"outputTokens":3}
{"type":"result","message":{"content":[{"type":"tool_result","tool_use_id":"toolu_1","text":"SKILL.md"}]},"costUSD":0.004,"durationMs":900}
"#;

#[test]
fn test_transcript_json() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "run1-basics.jsonl", TRANSCRIPT);

    let output = skillbench()
        .args(["--format", "json", "transcript"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["entries"], 2);
    assert_eq!(json["skippedLines"], 1);
    assert_eq!(json["model"], "claude-haiku");
    assert_eq!(json["finalResponse"], "Done");
    assert_eq!(json["metrics"]["toolCount"], 1);
    assert_eq!(json["metrics"]["tokensTotal"], 15);
    assert_eq!(json["metrics"]["durationMs"], 900);
    assert_eq!(json["toolCalls"][0]["result"], "SKILL.md");
}

#[test]
fn test_transcript_human() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "t.jsonl", TRANSCRIPT);

    skillbench()
        .arg("transcript")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("model: claude-haiku"))
        .stdout(predicate::str::contains("Bash [toolu_1] answered"))
        .stdout(predicate::str::contains("final response:\nDone"));
}

#[test]
fn test_transcript_missing_file() {
    skillbench()
        .args(["transcript", "/nonexistent/transcript.jsonl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}
