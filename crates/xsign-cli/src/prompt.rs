/*
[INPUT]:  Operator input on stdin (terminal or pipe)
[OUTPUT]: Target URL and compacted JSON request body
[POS]:    CLI input - interactive prompts
[UPDATE]: When prompt wording or body entry rules change
*/

use anyhow::{Context, Result, bail};
use dialoguer::Input;
use std::io::{self, BufRead, IsTerminal, Write};
use xsign_adapter::http::compact_json;

/// Ask for the target URL. Prompts go to stderr; stdout carries results only.
pub fn read_url() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        let url: String = Input::new()
            .with_prompt("URL")
            .interact_text()
            .context("read URL")?;
        return Ok(url.trim().to_string());
    }

    eprint!("URL: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read URL")?;
    let url = line.trim();
    if url.is_empty() {
        bail!("no URL given");
    }
    Ok(url.to_string())
}

/// Read a JSON body, one line at a time, until an empty line or EOF
pub fn read_body() -> Result<Vec<u8>> {
    eprintln!("Body (JSON, finish with an empty line):");
    let text = collect_body(io::stdin().lock()).context("read request body")?;
    compact_json(&text).context("compact request body")
}

fn collect_body(reader: impl BufRead) -> io::Result<String> {
    let mut text = String::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}
