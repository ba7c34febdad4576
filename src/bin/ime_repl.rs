//! Minimal line-oriented harness for exercising a [`Session`] by hand: not a
//! keyboard frontend, just enough to load dictionaries and try words from
//! stdin during development.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use ime_core::core::key_proximity::KeyProximityMap;
use ime_core::{Session, SuggestionRequestFlags};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let proximity_path: Option<PathBuf> = args.next().map(PathBuf::from);
    let dict_paths: Vec<PathBuf> = args.map(PathBuf::from).collect();

    let proximity = match &proximity_path {
        Some(path) => KeyProximityMap::load(path).unwrap_or_else(|e| {
            eprintln!("failed to load proximity map {}: {e}", path.display());
            KeyProximityMap::empty()
        }),
        None => KeyProximityMap::empty(),
    };

    let mut session = Session::with_default_config(proximity);
    for path in &dict_paths {
        if let Err(e) = session.load_base_dictionary(path) {
            eprintln!("failed to load dictionary {}: {e}", path.display());
        }
    }
    if dict_paths.is_empty() {
        eprintln!("usage: ime_repl [proximity.json] dict1.txt [dict2.txt ...]");
        eprintln!("no dictionaries loaded; type words to see empty results");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush().ok();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let word = line.trim();
        if word.is_empty() {
            print!("> ");
            stdout.flush().ok();
            continue;
        }
        if word == ":quit" {
            break;
        }

        let results = session.suggest(word, SuggestionRequestFlags::default());
        if results.is_empty() {
            println!("(no suggestions)");
        }
        for candidate in &results {
            println!(
                "  {:<16} dist={} conf={:.2} auto_commit={}",
                candidate.text,
                candidate.edit_distance,
                candidate.confidence,
                candidate.is_eligible_for_auto_commit
            );
        }
        print!("> ");
        stdout.flush().ok();
    }
}
