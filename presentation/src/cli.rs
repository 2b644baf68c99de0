use crate::http;
use anyhow::anyhow;
use application::bootstrap::build_service;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use domain::corpus::ExampleCorpus;
use domain::errors::PipelineError;
use domain::models::{QueryAnswer, Row};
use infrastructure::config::Config;
use serde_json::Value;
use shared::input::ask_line;
use shared::types::Result;
use std::sync::Arc;

/// Ask questions about the t-shirt store in plain English and get SQL plus rows back.
#[derive(Parser, Debug)]
#[command(name = "askql")]
#[command(about = "Grounded text-to-SQL for the t-shirt store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate one question into SQL, run it and print the rows
    Ask {
        /// Print the answer as JSON instead of a table
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,

        /// Print the grounding prompt before answering
        #[arg(long, action = ArgAction::SetTrue)]
        show_prompt: bool,

        /// The question (asked interactively when empty)
        #[arg(value_parser, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Serve POST /get_sql_query over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
    /// List the bundled example corpus
    Examples,
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Command::Ask {
                json,
                show_prompt,
                question,
            } => self.ask(question, json, show_prompt).await,
            Command::Serve { host, port } => {
                let host = host.unwrap_or_else(|| self.config.host.clone());
                let port = port.unwrap_or(self.config.port);
                let service = Arc::new(build_service(&self.config).await?);
                http::serve(service, &host, port).await
            }
            Command::Examples => {
                print!("{}", render_examples(&ExampleCorpus::t_shirt_store()));
                Ok(())
            }
        }
    }

    async fn ask(&self, words: Vec<String>, json: bool, show_prompt: bool) -> Result<()> {
        let question = if words.is_empty() {
            ask_line("Question")?
        } else {
            words.join(" ")
        };

        if question.trim().is_empty() {
            return Err(anyhow!("{}", PipelineError::EmptyQuestion.public_message()));
        }

        let service = build_service(&self.config).await?;

        let prepared = service.prepare(&question).await.map_err(describe)?;
        if show_prompt {
            println!("{}", "Prompt:".bold());
            println!("{}\n", prepared.prompt);
        }
        let answer = service.answer_prepared(prepared).await.map_err(describe)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print!("{}", render_answer(&answer));
        }
        Ok(())
    }
}

fn describe(err: PipelineError) -> anyhow::Error {
    anyhow!("{} ({})", err.public_message(), err)
}

fn render_examples(corpus: &ExampleCorpus) -> String {
    let mut out = String::new();
    for (position, example) in corpus.examples().iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {}\n    {}\n",
            position,
            example.question,
            example.sql.green()
        ));
    }
    out
}

fn render_answer(answer: &QueryAnswer) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        "Closest example:".dimmed(),
        format!(
            "#{} {} (distance {:.4})",
            answer.closest_example.position,
            answer.closest_example.question,
            answer.closest_example.distance
        )
        .dimmed()
    ));
    out.push_str(&format!("{} {}\n\n", "SQL:".bold(), answer.sql_query.green()));
    out.push_str(&render_rows(&answer.rows));
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Plain aligned table; the column set comes from the first row.
fn render_rows(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)\n".to_string();
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(*h).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.clone()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push_str(&format!("({} row{})\n", rows.len(), if rows.len() == 1 { "" } else { "s" }));
    out
}
