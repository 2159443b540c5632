//! The `earlyedge init` command.

use std::path::Path;

use anyhow::Result;

const STARTER_CONFIG: &str = r#"# earlyedge configuration
#
# Environment variable overrides: EARLYEDGE_SCORER_URL,
# EARLYEDGE_PROFILE_URL, EARLYEDGE_PARENT_ID.

scorer_base_url = "http://127.0.0.1:8000"
profile_base_url = "http://127.0.0.1:3000/api/auth/account"
# parent_id = "${EARLYEDGE_PARENT_ID}"
timeout_secs = 30
output_dir = "./earlyedge-results"
bank_dir = "./banks"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "letter-confusion-starter"
name = "Letter Confusion (starter)"
description = "Commonly mirrored letter pairs"
test = "letter-confusion"

[[items]]
id = "b-d-match"
question_type = "matching"
prompt = "Tap the letter that matches the first one: b"
options = ["b", "d", "p", "q"]
answer = "b"

[[items]]
id = "p-q-match"
question_type = "matching"
prompt = "Tap the letter that matches the first one: p"
options = ["q", "p", "b", "d"]
answer = "p"

[[items]]
id = "b-d-same"
question_type = "same_different"
prompt = "Are these the same letter? b d"
options = ["same", "different"]
answer = "different"

[[items]]
id = "m-w-same"
question_type = "same_different"
prompt = "Are these the same letter? m w"
options = ["same", "different"]
answer = "different"

[[items]]
id = "o-o-same"
question_type = "same_different"
prompt = "Are these the same letter? o o"
options = ["same", "different"]
answer = "same"
"#;

pub fn execute() -> Result<()> {
    write_if_absent(Path::new("earlyedge.toml"), STARTER_CONFIG)?;
    std::fs::create_dir_all("banks")?;
    write_if_absent(Path::new("banks/letter_confusion.toml"), EXAMPLE_BANK)?;

    println!("Created earlyedge.toml and banks/letter_confusion.toml");
    println!("Try: earlyedge run --test letter-confusion --bank banks/letter_confusion.toml");
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping", path.display());
        return Ok(());
    }
    std::fs::write(path, content)?;
    Ok(())
}
