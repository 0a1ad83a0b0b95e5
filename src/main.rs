use clap::{Arg, ArgAction, Command};
use pattern_translator::{
    FallbackPolicy, SourceNode, TranslationResult, Translator, TranslatorConfig,
    load_config_from_file, parse_fragment,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn main() -> ExitCode {
    let matches = Command::new("pattern-translate")
        .version("0.1.0")
        .about("Translate TypeScript and Python idioms into Rust")
        .arg(
            Arg::new("fragments")
                .help("Source fragments to translate (read from stdin when omitted)")
                .num_args(0..)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON translator config file"),
        )
        .arg(
            Arg::new("rules")
                .long("rules")
                .short('r')
                .help("JSON rule file layered after the built-in rules")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("no-builtin")
                .long("no-builtin")
                .help("Start from an empty catalog instead of the built-in rules")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("fallback")
                .long("fallback")
                .short('f')
                .help("What to emit for unsupported constructs")
                .value_parser(["fail", "pass-through", "comment"]),
        )
        .arg(
            Arg::new("nodes")
                .long("nodes")
                .help("Treat input as a JSON array of pre-parsed source nodes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("explain")
                .long("explain")
                .short('e')
                .help("Print the rules that accept each fragment, in match order")
                .action(ArgAction::SetTrue)
                .conflicts_with("nodes"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log rule selection")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => match load_config_from_file(&PathBuf::from(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TranslatorConfig::default(),
    };
    if matches.get_flag("no-builtin") {
        config.builtin = false;
    }
    if let Some(rules) = matches.get_many::<String>("rules") {
        config.rules.extend(rules.map(PathBuf::from));
    }
    if let Some(fallback) = matches.get_one::<String>("fallback") {
        match fallback.parse::<FallbackPolicy>() {
            Ok(fallback) => config.fallback = fallback,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let translator = match config.build_translator() {
        Ok(translator) => translator,
        Err(e) => {
            error!("Failed to build rule catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = match matches.get_many::<String>("fragments") {
        Some(fragments) => fragments.cloned().collect::<Vec<_>>(),
        None => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                error!("Failed to read stdin: {}", e);
                return ExitCode::FAILURE;
            }
            if matches.get_flag("nodes") {
                vec![text]
            } else {
                split_fragments(&text)
            }
        }
    };

    let results = if matches.get_flag("nodes") {
        match translate_nodes(&translator, &input) {
            Ok(results) => results,
            Err(e) => {
                error!("Invalid node JSON: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        if matches.get_flag("explain") {
            explain(&translator, &input);
        }
        translator.translate_batch(input.as_slice())
    };

    let (output, failed) = render_results(results);
    println!("{}", output);

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// One output block per result, in input order. Failed fragments leave a
/// `// error:` marker in their place.
fn render_results(results: Vec<TranslationResult>) -> (String, bool) {
    let mut failed = false;
    let mut outputs = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            TranslationResult::Translated(text) => outputs.push(text),
            TranslationResult::Failed(failure) => {
                failed = true;
                eprintln!("fragment {}: {}", i + 1, failure.error);
                let marker = failure
                    .error
                    .to_string()
                    .lines()
                    .map(|line| format!("// error: {}", line))
                    .collect::<Vec<_>>()
                    .join("\n");
                outputs.push(marker);
            }
        }
    }
    (outputs.join("\n\n"), failed)
}

/// Each input is a JSON array of nodes, or a single node
fn translate_nodes(
    translator: &Translator,
    inputs: &[String],
) -> Result<Vec<TranslationResult>, serde_json::Error> {
    let mut results = Vec::new();
    for input in inputs {
        let nodes: Vec<SourceNode> = match serde_json::from_str::<Vec<SourceNode>>(input) {
            Ok(nodes) => nodes,
            Err(_) => vec![serde_json::from_str::<SourceNode>(input)?],
        };
        for node in nodes {
            let source = serde_json::to_string(&node)?;
            results.push(translator.translate_parsed(&source, node));
        }
    }
    Ok(results)
}

fn explain(translator: &Translator, fragments: &[String]) {
    let matcher = translator.matcher();
    for (i, fragment) in fragments.iter().enumerate() {
        match parse_fragment(fragment) {
            Ok(node) => {
                let names: Vec<&str> = matcher
                    .candidates(&node)
                    .iter()
                    .map(|rule| rule.name())
                    .collect();
                eprintln!("fragment {} ({}): {}", i + 1, node.kind, names.join(", "));
            }
            Err(e) => eprintln!("fragment {}: {}", i + 1, e),
        }
    }
}

/// Split stdin into fragments. A blank line followed by an unindented line
/// starts a new fragment, so blank lines inside class bodies are kept.
fn split_fragments(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut after_blank = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        let indented = line.starts_with(char::is_whitespace);
        if after_blank && !indented && !current.is_empty() {
            fragments.push(current.join("\n"));
            current.clear();
        } else if after_blank && !current.is_empty() {
            current.push("");
        }
        after_blank = false;
        current.push(line);
    }
    if !current.is_empty() {
        fragments.push(current.join("\n"));
    }
    fragments
}
