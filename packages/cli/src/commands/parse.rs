use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use embedtweet_parser::Tweet;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Embed markup file, directory of .html files, or `-` for stdin
    pub input: String,

    /// Print the full tweet as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub fn parse(args: ParseArgs) -> Result<()> {
    if args.input == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return report(None, &embedtweet_parser::parse(&raw), args.json);
    }

    let input = PathBuf::from(&args.input);
    if input.is_file() {
        let raw = std::fs::read_to_string(&input)?;
        report(Some(&input), &embedtweet_parser::parse(&raw), args.json)
    } else if input.is_dir() {
        let files = find_html_files(&input);
        if files.is_empty() {
            println!("{}", "⚠️  No .html files found".yellow());
            return Ok(());
        }

        for file in &files {
            let raw = std::fs::read_to_string(file)?;
            report(Some(file), &embedtweet_parser::parse(&raw), args.json)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Input path does not exist: {}", input.display()))
    }
}

fn report(path: Option<&Path>, tweet: &Tweet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tweet)?);
        return Ok(());
    }

    let label = path.map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());
    match &tweet.id {
        Some(id) => println!("  {} {} → {}", "✓".green(), label, id),
        None => println!("  {} {} → {}", "✗".yellow(), label, "no tweet id".dimmed()),
    }
    Ok(())
}

fn find_html_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "html"))
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_html_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.html"), "<p></p>").unwrap();
        std::fs::write(dir.path().join("nested/b.html"), "<p></p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = find_html_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "html"));
    }

    #[test]
    fn test_missing_input() {
        let args = ParseArgs {
            input: "/definitely/not/here.html".to_string(),
            json: false,
        };
        assert!(parse(args).is_err());
    }
}
